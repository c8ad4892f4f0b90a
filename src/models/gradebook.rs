//! Grade book records and the calculations shown on the grade book page.

use crate::coerce::leading_float;
use std::collections::HashMap;

/// Subjects every new student is graded in, in display order.
pub const SUBJECTS: [&str; 3] = ["Mathe", "Deutsch", "Englisch"];

#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub subject: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub name: String,
    /// Subject order is preserved as entered
    pub grades: Vec<Grade>,
}

impl Student {
    /// Build a student graded in [`SUBJECTS`], values in the same order.
    pub fn new(name: impl Into<String>, values: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            grades: SUBJECTS
                .iter()
                .zip(values)
                .map(|(subject, value)| Grade {
                    subject: subject.to_string(),
                    value,
                })
                .collect(),
        }
    }

    pub fn grade(&self, subject: &str) -> Option<f64> {
        self.grades
            .iter()
            .find(|g| g.subject == subject)
            .map(|g| g.value)
    }

    /// Sum of grades divided by their count; `None` without grades.
    pub fn average(&self) -> Option<f64> {
        if self.grades.is_empty() {
            return None;
        }
        let sum: f64 = self.grades.iter().map(|g| g.value).sum();
        Some(sum / self.grades.len() as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestStudent {
    pub name: String,
    pub average: f64,
}

/// Initial roster of a fresh session.
pub fn seed_students() -> Vec<Student> {
    vec![
        Student::new("Anna", [3.0, 2.0, 1.0]),
        Student::new("Ben", [4.0, 3.0, 2.0]),
        Student::new("Clara", [2.0, 1.0, 1.0]),
    ]
}

/// Student with the lowest average. On ties the first one encountered wins.
pub fn best_student(students: &[Student]) -> Option<BestStudent> {
    let mut best: Option<BestStudent> = None;
    for student in students {
        let Some(avg) = student.average() else {
            continue;
        };
        if best.as_ref().is_none_or(|b| avg < b.average) {
            best = Some(BestStudent {
                name: student.name.clone(),
                average: avg,
            });
        }
    }
    best
}

/// Average of one subject over all students graded in it.
pub fn subject_average(students: &[Student], subject: &str) -> Option<f64> {
    let grades: Vec<f64> = students.iter().filter_map(|s| s.grade(subject)).collect();
    if grades.is_empty() {
        return None;
    }
    Some(grades.iter().sum::<f64>() / grades.len() as f64)
}

/// Build a student from submitted form fields.
///
/// Returns `None` when the name is missing or empty. Grades are read leniently:
/// absent or non-numeric values count as 0 and the range is not checked.
pub fn student_from_form(fields: &HashMap<String, String>) -> Option<Student> {
    let name = fields.get("name").map(String::as_str).unwrap_or("");
    if name.is_empty() {
        return None;
    }
    let value = |subject: &str| fields.get(subject).map(|v| leading_float(v)).unwrap_or(0.0);
    Some(Student::new(
        name,
        [value(SUBJECTS[0]), value(SUBJECTS[1]), value(SUBJECTS[2])],
    ))
}

/// Format a grade rounded to two decimals, without trailing zeros.
pub fn format_grade(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let text = format!("{:.2}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
