//! HTML rendering for the probe and grade book pages.
//!
//! Plain server-rendered markup; every dynamic value goes through [`escape_html`].

use crate::models::gradebook::{best_student, format_grade, subject_average};
use crate::models::{ConnectedReport, CrudRow, ProbeReport, SUBJECTS, Student};
use std::fmt::Write;

const PLACEHOLDER: &str = "—";

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"de\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{}</title>\n</head>\n<body>\n<main>\n{}</main>\n</body>\n</html>\n",
        escape_html(title),
        body
    )
}

/// Fixed page for a missing database driver.
pub fn driver_missing_page(driver: &str) -> String {
    let body = format!(
        "<div class=\"alert alert-danger\"><strong>Database driver missing:</strong> \
         no driver for <code>{}</code> is available in this build. \
         Supported drivers: <code>mysql</code>, <code>mariadb</code>, <code>sqlite</code>.</div>\n",
        escape_html(driver)
    );
    page("DB Test", &body)
}

pub fn error_page(message: &str, suggestion: Option<&str>) -> String {
    let mut body = format!(
        "<div class=\"alert alert-danger\"><pre>{}</pre></div>\n",
        escape_html(message)
    );
    if let Some(suggestion) = suggestion {
        let _ = writeln!(body, "<p>{}</p>", escape_html(suggestion));
    }
    page("Error", &body)
}

pub fn db_test_page(report: &ProbeReport) -> String {
    let mut body = String::from("<h1>MySQL DB Test</h1>\n");
    match report {
        ProbeReport::Connected(report) => render_connected(&mut body, report),
        ProbeReport::Failed { errors } => {
            let _ = write!(
                body,
                "<div class=\"alert alert-danger\">Connection failed. Attempted targets:\
                 <pre>{}</pre></div>\n",
                escape_html(&errors.join("\n"))
            );
        }
    }
    page("DB Test", &body)
}

fn render_connected(body: &mut String, report: &ConnectedReport) {
    let _ = write!(
        body,
        "<div class=\"alert alert-success\">Connected to <strong>{}</strong> \
         as user <strong>{}</strong>.</div>\n",
        escape_html(&report.target.to_string()),
        escape_html(&report.user)
    );

    let _ = write!(
        body,
        "<h2>Quick queries</h2>\n<ul>\n<li>Current database: <strong>{}</strong></li>\n\
         <li>CURRENT_USER(): <strong>{}</strong></li>\n</ul>\n",
        escape_html(report.current_database.as_deref().unwrap_or(PLACEHOLDER)),
        escape_html(report.current_user.as_deref().unwrap_or(PLACEHOLDER))
    );

    body.push_str("<h2>Tables</h2>\n");
    let tables = &report.tables;
    if let Some(error) = &tables.error {
        let _ = writeln!(
            body,
            "<div class=\"alert alert-warning\">Tables could not be loaded: <code>{}</code></div>",
            escape_html(error)
        );
    } else {
        let _ = write!(body, "<p>Total: <strong>{}</strong>", tables.total);
        if tables.is_truncated() {
            let _ = write!(body, " (shown: <strong>{}</strong>)", tables.names.len());
        }
        body.push_str("</p>\n");
        if tables.names.is_empty() {
            body.push_str("<p>No tables.</p>\n");
        } else {
            body.push_str("<ul class=\"tables\">\n");
            for name in &tables.names {
                let _ = writeln!(body, "<li>{}</li>", escape_html(name));
            }
            body.push_str("</ul>\n");
        }
    }

    let crud = &report.crud;
    let status = if report.is_ok() {
        "OK (CRUD; drop scheduled after response)"
    } else {
        "ERROR"
    };
    let _ = write!(
        body,
        "<h2>CRUD test (create/insert/update/delete/drop)</h2>\n\
         <div class=\"card\">\n<div>Test table: <code>{}</code></div>\n\
         <div>Status: <strong>{}</strong></div>\n\
         <div class=\"small\">ok={}, drop_planned={}</div>\n",
        escape_html(&crud.table_name),
        status,
        crud.succeeded,
        report.cleanup.drop_planned()
    );
    if !crud.errors.is_empty() {
        let _ = writeln!(
            body,
            "<div class=\"text-danger\"><pre>{}</pre></div>",
            escape_html(&crud.errors.join("\n"))
        );
    }
    if let Some(error) = &report.cleanup.error {
        let _ = writeln!(
            body,
            "<div class=\"text-danger\"><pre>Cleanup failed: {}</pre></div>",
            escape_html(error)
        );
    }
    body.push_str("</div>\n");

    render_rows(body, "Rows after INSERT", &crud.rows_after_insert);
    render_rows(body, "Rows after UPDATE", &crud.rows_after_update);
    render_rows(body, "Rows after DELETE", &crud.rows_after_delete);

    let _ = write!(
        body,
        "<h3>SQL log <span class=\"badge\">{} statements</span></h3>\n",
        report.statements.len()
    );
    if report.statements.is_empty() {
        body.push_str("<p>No log.</p>\n");
    } else {
        body.push_str(
            "<table class=\"log\">\n<thead><tr><th>SQL</th><th>Params</th><th>ms</th>\
             <th>rowCount</th></tr></thead>\n<tbody>\n",
        );
        for entry in &report.statements {
            let _ = writeln!(
                body,
                "<tr><td><code>{}</code></td><td><code>{}</code></td>\
                 <td><code>{}</code></td><td><code>{}</code></td></tr>",
                escape_html(&entry.sql),
                escape_html(&entry.params_json()),
                entry.elapsed_ms,
                entry.row_count
            );
        }
        body.push_str("</tbody>\n</table>\n");
    }
}

fn render_rows(body: &mut String, title: &str, rows: &[CrudRow]) {
    let _ = writeln!(body, "<h3>{}</h3>", escape_html(title));
    if rows.is_empty() {
        body.push_str("<p>No rows.</p>\n");
        return;
    }
    body.push_str(
        "<table class=\"rows\">\n<thead><tr><th>id</th><th>name</th><th>qty</th></tr></thead>\n<tbody>\n",
    );
    for row in rows {
        let _ = writeln!(
            body,
            "<tr><td><code>{}</code></td><td><code>{}</code></td><td><code>{}</code></td></tr>",
            row.id,
            escape_html(&row.name),
            row.qty
        );
    }
    body.push_str("</tbody>\n</table>\n");
}

pub fn gradebook_page(students: &[Student]) -> String {
    let mut body = String::from("<h1>Student grades</h1>\n");

    body.push_str(
        "<table class=\"students\">\n<thead><tr><th>Name</th><th>Average</th></tr></thead>\n<tbody>\n",
    );
    for student in students {
        let average = student
            .average()
            .map(format_grade)
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_html(&student.name),
            average
        );
    }
    body.push_str("</tbody>\n</table>\n");

    body.push_str("<div class=\"subjects\">\n");
    for subject in SUBJECTS {
        let average = subject_average(students, subject)
            .map(format_grade)
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let _ = writeln!(
            body,
            "<div class=\"subject\"><h3>{}</h3><p>Average: <strong>{}</strong></p></div>",
            escape_html(subject),
            average
        );
    }
    body.push_str("</div>\n");

    match best_student(students) {
        Some(best) => {
            let _ = writeln!(
                body,
                "<div class=\"best\"><h2>Best student</h2><h3>{}</h3>\
                 <p>Average: <strong>{}</strong></p></div>",
                escape_html(&best.name),
                format_grade(best.average)
            );
        }
        None => body.push_str("<div class=\"best\"><h2>Best student</h2><p>—</p></div>\n"),
    }

    body.push_str(
        "<form method=\"post\">\n<input type=\"text\" name=\"name\" placeholder=\"Name\" required>\n",
    );
    for subject in SUBJECTS {
        let _ = writeln!(
            body,
            "<input type=\"number\" name=\"{0}\" placeholder=\"{0}\" min=\"1\" max=\"5\" required>",
            subject
        );
    }
    body.push_str("<button type=\"submit\">Add</button>\n</form>\n");

    page("Grade book", &body)
}
