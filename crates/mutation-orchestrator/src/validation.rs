//! Client-side checks run before any request is sent.
//!
//! Two layers: the form only insists on a title, the data layer additionally
//! needs contact details and a sane salary range before a row is inserted.
//! Profile patches may leave required fields out but never blank them.

use crate::{MutationError, MutationResult};
use board_types::{
    NewApplication, SchoolProfilePatch, TeacherProfilePatch, Vacancy, VacancyInsert, VacancyPatch,
};

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn salary_range(min: Option<u32>, max: Option<u32>) -> MutationResult<()> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(MutationError::validation(format!(
            "salary_min ({}) is greater than salary_max ({})",
            min, max
        ))),
        _ => Ok(()),
    }
}

pub fn check_title(title: &str) -> MutationResult<()> {
    if blank(title) {
        return Err(MutationError::validation("title is required"));
    }
    Ok(())
}

/// Data-layer checks on a fully defaulted insert row.
pub fn check_vacancy_row(row: &VacancyInsert) -> MutationResult<()> {
    check_title(&row.title)?;
    if blank(&row.contact_name) {
        return Err(MutationError::validation("contact_name is required"));
    }
    if blank(&row.contact_phone) {
        return Err(MutationError::validation("contact_phone is required"));
    }
    salary_range(row.salary_min, row.salary_max)
}

fn required(field: &str, value: Option<&str>) -> MutationResult<()> {
    if value.is_some_and(blank) {
        return Err(MutationError::validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Fields present in a patch may not be blanked out.
///
/// The salary range is only compared when the patch carries both bounds.
/// A single bound has to be checked against the stored row with
/// [`check_patched_salary`].
pub fn check_vacancy_patch(patch: &VacancyPatch) -> MutationResult<()> {
    if patch.is_empty() {
        return Err(MutationError::validation("nothing to update"));
    }
    if let Some(title) = &patch.title {
        check_title(title)?;
    }
    required("contact_name", patch.contact_name.as_deref())?;
    required("contact_phone", patch.contact_phone.as_deref())?;
    salary_range(patch.salary_min, patch.salary_max)
}

/// True when the patch moves only one salary bound.
pub fn touches_one_salary_bound(patch: &VacancyPatch) -> bool {
    patch.salary_min.is_some() != patch.salary_max.is_some()
}

/// Range check on the row as it will look after the patch lands.
pub fn check_patched_salary(patch: &VacancyPatch, stored: &Vacancy) -> MutationResult<()> {
    salary_range(
        patch.salary_min.or(stored.salary_min),
        patch.salary_max.or(stored.salary_max),
    )
}

pub fn check_teacher_patch(patch: &TeacherProfilePatch) -> MutationResult<()> {
    required("full_name", patch.full_name.as_deref())?;
    required("specialization", patch.specialization.as_deref())?;
    required("education", patch.education.as_deref())
}

pub fn check_school_patch(patch: &SchoolProfilePatch) -> MutationResult<()> {
    required("school_name", patch.school_name.as_deref())?;
    required("address", patch.address.as_deref())
}

pub fn check_application(application: &NewApplication) -> MutationResult<()> {
    if blank(&application.vacancy_id) {
        return Err(MutationError::validation("vacancy_id is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use board_types::NewVacancy;

    fn complete() -> NewVacancy {
        NewVacancy {
            contact_name: Some("Gulnara".into()),
            contact_phone: Some("+996 555 123 456".into()),
            ..NewVacancy::titled("Chemistry teacher")
        }
    }

    #[test]
    fn complete_row_passes() {
        assert!(check_vacancy_row(&complete().into_insert("s1")).is_ok());
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = check_title("   ").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationError);
    }

    #[test]
    fn missing_contact_is_rejected() {
        let row = NewVacancy {
            contact_phone: None,
            ..complete()
        }
        .into_insert("s1");
        let err = check_vacancy_row(&row).unwrap_err();
        assert!(err.message.contains("contact_phone"));
    }

    #[test]
    fn inverted_salary_range_is_rejected() {
        let row = NewVacancy {
            salary_min: Some(40_000),
            salary_max: Some(25_000),
            ..complete()
        }
        .into_insert("s1");
        assert!(check_vacancy_row(&row).is_err());
    }

    #[test]
    fn patches_cannot_blank_required_fields() {
        assert!(check_vacancy_patch(&VacancyPatch::default()).is_err());
        assert!(check_vacancy_patch(&VacancyPatch {
            title: Some(" ".into()),
            ..Default::default()
        })
        .is_err());
        assert!(check_vacancy_patch(&VacancyPatch {
            location: Some("Osh".into()),
            ..Default::default()
        })
        .is_ok());
    }

    #[test]
    fn profile_patches_cannot_blank_required_fields() {
        let err = check_teacher_patch(&TeacherProfilePatch {
            full_name: Some("".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationError);
        assert!(err.message.contains("full_name"));

        assert!(check_school_patch(&SchoolProfilePatch {
            address: Some("  ".into()),
            ..Default::default()
        })
        .is_err());

        // Leaving a field out keeps the stored value.
        assert!(check_teacher_patch(&TeacherProfilePatch {
            phone: Some("".into()),
            ..Default::default()
        })
        .is_ok());
        assert!(check_school_patch(&SchoolProfilePatch::default()).is_ok());
    }

    #[test]
    fn single_salary_bound_is_left_to_the_stored_row() {
        let patch = VacancyPatch {
            salary_min: Some(90_000),
            ..Default::default()
        };
        assert!(check_vacancy_patch(&patch).is_ok());
        assert!(touches_one_salary_bound(&patch));
        assert!(!touches_one_salary_bound(&VacancyPatch {
            salary_min: Some(1),
            salary_max: Some(2),
            ..Default::default()
        }));
    }
}
