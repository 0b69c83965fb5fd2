//! Version 1: the course catalog.

use fake::faker::job::en::Title;
use fake::Fake;
use rand::rngs::StdRng;
use rand::Rng;

use super::{sentence, title};
use crate::db::RowGenerator;
use crate::error::SeedError;
use crate::registry::{Dependency, DependencyIds, SeedStep, TableTask};
use crate::row;

pub const VERSION: i32 = 1;

const DIFFICULTY_LEVELS: [(&str, &str); 3] = [
    ("beginner", "for beginners"),
    ("intermediate", "for intermediate"),
    ("advanced", "for advanced"),
];

const TECHNOLOGIES: [&str; 10] = [
    "Go", "Rust", "Python", "PostgreSQL", "Redis", "Docker", "Kubernetes", "TypeScript",
    "React", "Kafka",
];

pub fn step() -> SeedStep {
    SeedStep::new(
        VERSION,
        vec![
            TableTask::new(
                "difficulty_level",
                &["name", "description"],
                difficulty_levels,
            )
            .fixed_rows(DIFFICULTY_LEVELS.len()),
            TableTask::new(
                "course_specialization",
                &["name", "description"],
                course_specializations,
            ),
            TableTask::new(
                "course",
                &[
                    "name",
                    "description",
                    "specialization_id",
                    "duration",
                    "price",
                    "difficulty_level_id",
                ],
                courses,
            )
            .depends_on(Dependency::key("course_specialization"))
            .depends_on(Dependency::key("difficulty_level")),
            TableTask::new(
                "course_topic",
                &[
                    "name",
                    "description",
                    "technologies",
                    "labor_intensity_hours",
                    "projects_number",
                ],
                course_topics,
            ),
            TableTask::new(
                "course_topic_association",
                &["course_id", "topic_id"],
                course_topic_associations,
            )
            .depends_on(Dependency::key("course"))
            .depends_on(Dependency::key("course_topic")),
            TableTask::new("project", &["topic_id", "name", "description"], projects)
                .depends_on(Dependency::key("course_topic")),
        ],
    )
}

fn difficulty_levels(_: &DependencyIds, _: StdRng) -> Result<RowGenerator, SeedError> {
    Ok(Box::new(|i| {
        let (name, description) = DIFFICULTY_LEVELS[i % DIFFICULTY_LEVELS.len()];
        row![name, description]
    }))
}

fn course_specializations(_: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    Ok(Box::new(move |_| {
        let name: String = Title().fake_with_rng(&mut rng);
        row![name, sentence(&mut rng, 8..12)]
    }))
}

fn courses(ids: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    let specializations = ids.pool("course_specialization")?;
    let levels = ids.pool("difficulty_level")?;

    Ok(Box::new(move |_| {
        row![
            title(&mut rng),
            sentence(&mut rng, 20..30),
            specializations.pick(&mut rng),
            rng.gen_range(100..=500_i32),
            rng.gen_range(10_000..=200_000_i32),
            levels.pick(&mut rng),
        ]
    }))
}

fn course_topics(_: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    Ok(Box::new(move |_| {
        let count = rng.gen_range(1..=4);
        let technologies: Vec<&str> = (0..count)
            .map(|_| TECHNOLOGIES[rng.gen_range(0..TECHNOLOGIES.len())])
            .collect();

        row![
            title(&mut rng),
            sentence(&mut rng, 12..18),
            technologies.join(", "),
            rng.gen_range(10..=200_i32),
            rng.gen_range(1..=10_i32),
        ]
    }))
}

fn course_topic_associations(
    ids: &DependencyIds,
    mut rng: StdRng,
) -> Result<RowGenerator, SeedError> {
    let courses = ids.pool("course")?;
    let topics = ids.pool("course_topic")?;

    Ok(Box::new(move |_| {
        row![courses.pick(&mut rng), topics.pick(&mut rng)]
    }))
}

fn projects(ids: &DependencyIds, mut rng: StdRng) -> Result<RowGenerator, SeedError> {
    let topics = ids.pool("course_topic")?;

    Ok(Box::new(move |_| {
        row![
            topics.pick(&mut rng),
            title(&mut rng),
            sentence(&mut rng, 15..25),
        ]
    }))
}
