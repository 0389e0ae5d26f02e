//! Plain-text rendering for terminal output.

use board_types::{Application, Notification, Profile, Vacancy};

pub fn vacancy_line(v: &Vacancy) -> String {
    let state = if v.is_active { "published" } else { "draft" };
    let salary = match (v.salary_min, v.salary_max) {
        (Some(min), Some(max)) => format!("{}-{} KGS", min, max),
        (Some(min), None) => format!("from {} KGS", min),
        (None, Some(max)) => format!("up to {} KGS", max),
        (None, None) => "salary not stated".to_string(),
    };
    format!("{}  [{}]  {}  ({}, {})", v.id, state, v.title, v.location, salary)
}

pub fn vacancy_detail(v: &Vacancy) -> String {
    let mut out = vec![
        format!("{} ({})", v.title, v.id),
        format!("  subject:     {}", v.subject),
        format!("  location:    {}", v.location),
        format!("  employment:  {:?}", v.employment_type),
        format!("  contact:     {} {}", v.contact_name, v.contact_phone),
        format!("  visible:     {}", v.is_active),
    ];
    if !v.description.is_empty() {
        out.push(format!("  {}", v.description));
    }
    for r in &v.requirements {
        out.push(format!("  - requires: {}", r));
    }
    for b in &v.benefits {
        out.push(format!("  + {}", b));
    }
    out.join("\n")
}

pub fn profile(p: &Profile) -> String {
    let mut out = vec![format!("{} ({})", p.id(), p.role())];
    match p {
        Profile::Teacher(t) => {
            out.push(format!("  name:           {}", t.full_name));
            out.push(format!("  specialization: {}", t.specialization));
            out.push(format!("  education:      {}", t.education));
            if let Some(years) = t.experience_years {
                out.push(format!("  experience:     {} years", years));
            }
        }
        Profile::School(s) => {
            out.push(format!("  school:  {}", s.school_name));
            out.push(format!("  address: {}, {}", s.address, s.city));
        }
        Profile::Admin(_) => {}
    }
    out.push(format!("  published: {}", p.is_published()));
    let missing = p.missing_fields();
    if !missing.is_empty() {
        out.push(format!("  missing before publishing: {}", missing.join(", ")));
    }
    out.join("\n")
}

pub fn application_line(a: &Application) -> String {
    format!("{}  vacancy {}  teacher {}  {:?}", a.id, a.vacancy_id, a.teacher_id, a.status)
}

pub fn notification_line(n: &Notification) -> String {
    let marker = if n.is_read { " " } else { "*" };
    format!(
        "{} {}  {}  {}",
        marker,
        n.created_at.format("%Y-%m-%d %H:%M"),
        n.title,
        n.id
    )
}
