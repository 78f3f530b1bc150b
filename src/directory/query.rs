//! Read-only queries over a fetched employee list.

use std::cmp::Ordering;

use crate::upstream::types::EmployeeRecord;

/// Employees whose name contains `fragment` (case-sensitive).
pub fn search_by_name<'a>(employees: &'a [EmployeeRecord], fragment: &str) -> Vec<&'a EmployeeRecord> {
    employees
        .iter()
        .filter(|employee| employee.name.contains(fragment))
        .collect()
}

/// Highest salary truncated to a whole amount; 0 for an empty list.
pub fn highest_salary(employees: &[EmployeeRecord]) -> i64 {
    employees
        .iter()
        .map(|employee| employee.salary)
        .fold(None, |max: Option<f64>, salary| {
            Some(max.map_or(salary, |m| m.max(salary)))
        })
        .map_or(0, |max| max as i64)
}

/// Names of the `limit` best paid employees, highest first.
pub fn top_earner_names(employees: &[EmployeeRecord], limit: usize) -> Vec<String> {
    let mut ranked: Vec<&EmployeeRecord> = employees.iter().collect();
    ranked.sort_by(|a, b| b.salary.partial_cmp(&a.salary).unwrap_or(Ordering::Equal));
    ranked
        .into_iter()
        .take(limit)
        .map(|employee| employee.name.clone())
        .collect()
}
