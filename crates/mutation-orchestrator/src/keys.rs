//! Query keys shared by readers and the invalidation lists of mutations.

use entity_query_cache::QueryKey;

pub fn vacancies_public() -> QueryKey {
    QueryKey::new(&["vacancies", "public"])
}

pub fn vacancies_all() -> QueryKey {
    QueryKey::new(&["vacancies", "all"])
}

pub fn vacancies_active() -> QueryKey {
    QueryKey::new(&["vacancies", "active"])
}

/// Vacancies owned by one school, drafts included.
pub fn vacancies_by_school(school_id: &str) -> QueryKey {
    QueryKey::new(&["vacancies", "school", school_id])
}

pub fn vacancy(id: &str) -> QueryKey {
    QueryKey::new(&["vacancies", "detail", id])
}

pub fn profile(id: &str) -> QueryKey {
    QueryKey::new(&["profiles", id])
}

pub fn published_teachers() -> QueryKey {
    QueryKey::new(&["profiles", "list", "teachers"])
}

pub fn published_schools() -> QueryKey {
    QueryKey::new(&["profiles", "list", "schools"])
}

pub fn applications_by_teacher(teacher_id: &str) -> QueryKey {
    QueryKey::new(&["applications", "teacher", teacher_id])
}

pub fn applications_for_vacancy(vacancy_id: &str) -> QueryKey {
    QueryKey::new(&["applications", "vacancy", vacancy_id])
}

pub fn notifications(user_id: &str) -> QueryKey {
    QueryKey::new(&["notifications", user_id])
}

/// Everything a vacancy write can make stale.
pub fn vacancy_write_set(school_id: &str, vacancy_id: &str) -> Vec<QueryKey> {
    vec![
        vacancies_by_school(school_id),
        vacancies_public(),
        vacancies_all(),
        vacancies_active(),
        vacancy(vacancy_id),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vacancy_write_set_covers_listings_and_detail() {
        let keys: Vec<String> = vacancy_write_set("s1", "v1")
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(
            keys,
            vec![
                "vacancies/school/s1",
                "vacancies/public",
                "vacancies/all",
                "vacancies/active",
                "vacancies/detail/v1",
            ]
        );
    }
}
