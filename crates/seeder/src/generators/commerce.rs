//! Version 3: course sales, the career centre, the blog, reviews and certificates.

use fake::faker::company::en::{BsAdj, BsNoun, CompanyName};
use fake::faker::lorem::en::Paragraph;
use fake::Fake;
use rand::rngs::StdRng;
use rand::Rng;
use time::Duration;

use super::staff::{ACCOUNTS_TABLE, ACCOUNT_KEY};
use super::{past_date, past_timestamp, pick, sentence, title, url};
use crate::db::RowGenerator;
use crate::error::SeedError;
use crate::registry::{Dependency, DependencyIds, SeedStep, TableTask};
use crate::row;

pub const VERSION: i32 = 3;

const COURSE_TYPES: [(&str, i32); 4] = [
    ("Standard", 0),
    ("Students", 10),
    ("Disabled", 20),
    ("Veteran", 70),
];

const PURCHASE_STATUSES: [&str; 3] = ["Completed", "Pending", "Cancelled"];

const APPLICATION_STATUSES: [&str; 4] = ["Applied", "Interviewed", "Rejected", "Hired"];

const ACCOUNT: Dependency = Dependency::column(ACCOUNTS_TABLE, ACCOUNT_KEY);
const COURSE: Dependency = Dependency::column("course", "course_id");

pub fn step() -> SeedStep {
    SeedStep::new(
        VERSION,
        vec![
            TableTask::new(
                "course_calendar",
                &["course_id", "start_date", "end_sales_date", "remaining_places"],
                course_calendars,
            )
            .depends_on(COURSE),
            TableTask::new("course_type", &["type_name", "discount"], course_types)
                .fixed_rows(COURSE_TYPES.len()),
            TableTask::new(
                "purchase",
                &[
                    "user_id",
                    "course_id",
                    "purchase_date",
                    "course_type_id",
                    "total_price",
                    "purchase_status",
                ],
                purchases,
            )
            .depends_on(ACCOUNT)
            .depends_on(COURSE)
            .depends_on(Dependency::column("course_type", "id")),
            TableTask::new(
                "career_center_student",
                &[
                    "user_id",
                    "course_id",
                    "cv_url",
                    "career_support_start",
                    "support_period",
                ],
                career_center_students,
            )
            .depends_on(ACCOUNT)
            .depends_on(COURSE),
            TableTask::new(
                "partner_company",
                &[
                    "short_name",
                    "full_name",
                    "hired_graduates_count",
                    "requirements",
                    "agreement_status",
                ],
                partner_companies,
            ),
            TableTask::new(
                "job_application",
                &["student_id", "company_id", "application_date", "status"],
                job_applications,
            )
            .depends_on(Dependency::column("career_center_student", "id"))
            .depends_on(Dependency::column("partner_company", "company_id")),
            TableTask::new(
                "blog_post",
                &[
                    "author_id",
                    "title",
                    "publication_date",
                    "topic",
                    "reading_time_minutes",
                    "cover_image_url",
                    "content",
                ],
                blog_posts,
            )
            .depends_on(Dependency::column("employee", "id")),
            TableTask::new("tag", &["name"], tags),
            TableTask::new("post_tag", &["post_id", "tag_id"], post_tags)
                .depends_on(Dependency::key("blog_post"))
                .depends_on(Dependency::key("tag")),
            TableTask::new(
                "course_review",
                &["course_id", "user_id", "rating", "comment", "review_date"],
                course_reviews,
            )
            .depends_on(ACCOUNT)
            .depends_on(COURSE),
            TableTask::new(
                "certificate",
                &["user_id", "course_id", "issue_date"],
                certificates,
            )
            .depends_on(ACCOUNT)
            .depends_on(COURSE),
        ],
    )
}

fn course_calendars(ids: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    let courses = ids.pool(COURSE.table)?;

    Ok(Box::new(move |_| {
        let start = past_timestamp(&mut rng, 365);
        let end_sales = start - Duration::days(rng.gen_range(1..=30));
        row![
            courses.pick(&mut rng),
            start,
            end_sales,
            rng.gen_range(0..=100_i32),
        ]
    }))
}

fn course_types(_: &DependencyIds, _: StdRng) -> Result<RowGenerator, SeedError> {
    Ok(Box::new(|i| {
        let (name, discount) = COURSE_TYPES[i % COURSE_TYPES.len()];
        row![name, discount]
    }))
}

fn purchases(ids: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    let accounts = ids.pool(ACCOUNT.table)?;
    let courses = ids.pool(COURSE.table)?;
    let course_types = ids.pool("course_type")?;

    Ok(Box::new(move |_| {
        row![
            accounts.pick(&mut rng),
            courses.pick(&mut rng),
            past_timestamp(&mut rng, 365),
            course_types.pick(&mut rng),
            rng.gen_range(1000..=5000_i32),
            *pick(&mut rng, &PURCHASE_STATUSES),
        ]
    }))
}

fn career_center_students(
    ids: &DependencyIds,
    mut rng: StdRng,
) -> Result<RowGenerator, SeedError> {
    let accounts = ids.pool(ACCOUNT.table)?;
    let courses = ids.pool(COURSE.table)?;

    Ok(Box::new(move |_| {
        row![
            accounts.pick(&mut rng),
            courses.pick(&mut rng),
            url(&mut rng, "cv"),
            past_date(&mut rng, 365),
            rng.gen_range(1..=12_i32),
        ]
    }))
}

fn partner_companies(_: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    Ok(Box::new(move |_| {
        let short_name: String = CompanyName().fake_with_rng(&mut rng);
        let full_name = format!("{short_name} LLC");
        row![
            short_name,
            full_name,
            rng.gen_range(0..=100_i32),
            sentence(&mut rng, 8..12),
            rng.gen_bool(0.5),
        ]
    }))
}

fn job_applications(ids: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    let students = ids.pool("career_center_student")?;
    let companies = ids.pool("partner_company")?;

    Ok(Box::new(move |_| {
        row![
            students.pick(&mut rng),
            companies.pick(&mut rng),
            past_timestamp(&mut rng, 180),
            *pick(&mut rng, &APPLICATION_STATUSES),
        ]
    }))
}

fn blog_posts(ids: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    let authors = ids.pool("employee")?;

    Ok(Box::new(move |_| {
        let content: String = Paragraph(5..10).fake_with_rng(&mut rng);
        row![
            authors.pick(&mut rng),
            title(&mut rng),
            past_timestamp(&mut rng, 730),
            sentence(&mut rng, 2..4),
            rng.gen_range(5..=30_i32),
            url(&mut rng, "covers"),
            content,
        ]
    }))
}

fn tags(_: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    Ok(Box::new(move |_| {
        let adjective: String = BsAdj().fake_with_rng(&mut rng);
        let noun: String = BsNoun().fake_with_rng(&mut rng);
        row![format!("{adjective} {noun}")]
    }))
}

fn post_tags(ids: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    let posts = ids.pool("blog_post")?;
    let tags = ids.pool("tag")?;

    Ok(Box::new(move |_| {
        row![posts.pick(&mut rng), tags.pick(&mut rng)]
    }))
}

fn course_reviews(ids: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    let accounts = ids.pool(ACCOUNT.table)?;
    let courses = ids.pool(COURSE.table)?;

    Ok(Box::new(move |_| {
        row![
            courses.pick(&mut rng),
            accounts.pick(&mut rng),
            rng.gen_range(1..=5_i32),
            sentence(&mut rng, 8..14),
            past_timestamp(&mut rng, 365),
        ]
    }))
}

fn certificates(ids: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    let accounts = ids.pool(ACCOUNT.table)?;
    let courses = ids.pool(COURSE.table)?;

    Ok(Box::new(move |_| {
        row![
            accounts.pick(&mut rng),
            courses.pick(&mut rng),
            past_date(&mut rng, 365),
        ]
    }))
}
