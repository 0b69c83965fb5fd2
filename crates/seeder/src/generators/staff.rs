//! Version 2: user accounts and staff.
//!
//! The accounts table is `"user"` keyed by `account_id`; every later
//! reference to an account goes through that column.

use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::rngs::StdRng;
use rand::Rng;

use super::{hashed_password, past_date, url};
use crate::db::RowGenerator;
use crate::error::SeedError;
use crate::registry::{Dependency, DependencyIds, SeedStep, TableTask};
use crate::row;

pub const VERSION: i32 = 2;

pub const ACCOUNTS_TABLE: &str = "user";
pub const ACCOUNT_KEY: &str = "account_id";

const ROLES: [&str; 6] = [
    "admin",
    "teacher",
    "student",
    "smm manager",
    "mentor",
    "technical support",
];

pub fn step() -> SeedStep {
    SeedStep::new(
        VERSION,
        vec![
            TableTask::new(
                ACCOUNTS_TABLE,
                &[
                    "name",
                    "surname",
                    "birthdate",
                    "email",
                    "hashed_password",
                    "profile_picture_url",
                    "phone_number",
                    "snils_number",
                ],
                users,
            ),
            TableTask::new("role", &["name"], roles).fixed_rows(ROLES.len()),
            TableTask::new("employee", &["user_id", "role_id"], employees)
                .depends_on(Dependency::column(ACCOUNTS_TABLE, ACCOUNT_KEY))
                .depends_on(Dependency::key("role")),
            TableTask::new(
                "teacher",
                &[
                    "employee_id",
                    "work_place",
                    "overall_experience",
                    "specialization_experience",
                ],
                teachers,
            )
            .depends_on(Dependency::key("employee")),
            TableTask::new("course_teacher", &["teacher_id", "course_id"], course_teachers)
                .depends_on(Dependency::key("teacher"))
                .depends_on(Dependency::key("course")),
        ],
    )
}

/// Russian insurance number in its printed form, e.g. `123-456-789 01`.
fn snils(rng: &mut impl Rng) -> String {
    format!(
        "{:03}-{:03}-{:03} {:02}",
        rng.gen_range(0..1000),
        rng.gen_range(0..1000),
        rng.gen_range(0..1000),
        rng.gen_range(0..100)
    )
}

fn users(_: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    Ok(Box::new(move |_| {
        let name: String = FirstName().fake_with_rng(&mut rng);
        let surname: String = LastName().fake_with_rng(&mut rng);
        let email: String = SafeEmail().fake_with_rng(&mut rng);
        let phone: String = PhoneNumber().fake_with_rng(&mut rng);

        row![
            name,
            surname,
            past_date(&mut rng, 365 * 50),
            email,
            hashed_password(&mut rng),
            url(&mut rng, "avatars"),
            phone,
            snils(&mut rng),
        ]
    }))
}

fn roles(_: &DependencyIds, _: StdRng) -> Result<RowGenerator, SeedError> {
    Ok(Box::new(|i| row![ROLES[i % ROLES.len()]]))
}

fn employees(ids: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    let accounts = ids.pool(ACCOUNTS_TABLE)?;
    let roles = ids.pool("role")?;

    Ok(Box::new(move |_| {
        row![accounts.pick(&mut rng), roles.pick(&mut rng)]
    }))
}

fn teachers(ids: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    let employees = ids.pool("employee")?;

    Ok(Box::new(move |_| {
        let work_place: String = CompanyName().fake_with_rng(&mut rng);
        let overall = rng.gen_range(1..=30_i32);
        row![
            employees.pick(&mut rng),
            work_place,
            overall,
            rng.gen_range(1..=overall.min(20)),
        ]
    }))
}

fn course_teachers(ids: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    let teachers = ids.pool("teacher")?;
    let courses = ids.pool("course")?;

    Ok(Box::new(move |_| {
        row![teachers.pick(&mut rng), courses.pick(&mut rng)]
    }))
}
