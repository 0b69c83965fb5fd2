//! Synthetic row generators for the education schema.
//!
//! Each migration version lives in its own module and exposes a [`SeedStep`]:
//! - [`courses`]: version 1, course catalog (levels, specializations, courses, topics, projects)
//! - [`staff`]: version 2, accounts, roles, employees, teachers
//! - [`commerce`]: version 3, calendars, purchases, career centre, blog, reviews, certificates

pub mod commerce;
pub mod courses;
pub mod staff;

use std::ops::Range;

use fake::faker::lorem::en::{Sentence, Words};
use fake::Fake;
use rand::Rng;
use sha2::{Digest, Sha256};
use time::{Date, Duration, OffsetDateTime};

use crate::registry::SeedStep;

/// Every version known to the tool, in order.
pub fn education_steps() -> Vec<SeedStep> {
    vec![courses::step(), staff::step(), commerce::step()]
}

/// A short capitalised title without trailing punctuation.
pub(crate) fn title(rng: &mut impl Rng) -> String {
    let words: Vec<String> = Words(2..5).fake_with_rng(rng);
    let mut title = words.join(" ");
    if let Some(first) = title.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    title
}

pub(crate) fn sentence(rng: &mut impl Rng, words: Range<usize>) -> String {
    Sentence(words).fake_with_rng(rng)
}

/// A date up to `max_days_ago` days in the past.
pub(crate) fn past_date(rng: &mut impl Rng, max_days_ago: i64) -> Date {
    OffsetDateTime::now_utc().date() - Duration::days(rng.gen_range(0..max_days_ago.max(1)))
}

/// A timestamp up to `max_days_ago` days in the past, second precision.
pub(crate) fn past_timestamp(rng: &mut impl Rng, max_days_ago: i64) -> OffsetDateTime {
    let now = OffsetDateTime::now_utc().replace_nanosecond(0).unwrap_or(OffsetDateTime::UNIX_EPOCH);
    now - Duration::seconds(rng.gen_range(0..max_days_ago.max(1) * 86_400))
}

pub(crate) fn url(rng: &mut impl Rng, path: &str) -> String {
    let slug: Vec<String> = Words(1..3).fake_with_rng(rng);
    format!(
        "https://cdn.example.com/{path}/{}-{}.jpg",
        slug.join("-").to_lowercase(),
        rng.gen_range(1000..9999)
    )
}

/// Hex SHA-256 of a random throwaway password.
pub(crate) fn hashed_password(rng: &mut impl Rng) -> String {
    use fake::faker::internet::en::Password;

    let password: String = Password(10..16).fake_with_rng(rng);
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub(crate) fn pick<'a, T>(rng: &mut impl Rng, options: &'a [T]) -> &'a T {
    &options[rng.gen_range(0..options.len())]
}

#[cfg(test)]
pub(crate) mod test_support {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::db::SqlValue;
    use crate::registry::{DependencyIds, IdPool, TableTask};

    /// Dependency IDs `1..=n` for every dependency of `task`.
    pub fn ids_for(task: &TableTask, n: i64) -> DependencyIds {
        let mut ids = DependencyIds::new();
        for dep in &task.dependencies {
            ids.insert(IdPool::new(dep.table, (1..=n).collect()).unwrap());
        }
        ids
    }

    /// Generates `rows` rows for `task` with a fixed RNG seed.
    pub fn generate_rows(task: &TableTask, rows: usize) -> Vec<Vec<SqlValue>> {
        let ids = ids_for(task, 3);
        let mut generator = (task.generate)(&ids, StdRng::seed_from_u64(7)).unwrap();
        (0..rows).map(|i| generator(i)).collect()
    }

    /// Asserts every row matches the task's column count.
    pub fn assert_arity(task: &TableTask, rows: usize) {
        for row in generate_rows(task, rows) {
            assert_eq!(row.len(), task.columns.len(), "arity of {}", task.table);
        }
    }
}
