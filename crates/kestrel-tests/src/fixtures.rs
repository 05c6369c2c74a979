//! Test fixtures for creating sample data.

use kestrel_core::event::{CommitRef, Event, EventCause};
use kestrel_core::githost::GitServerKind;
use kestrel_core::recipe::{Recipe, StepDefinition};

pub const REPOSITORY: &str = "org/proj";

/// Factory for creating test recipes.
pub struct RecipeFixture;

impl RecipeFixture {
    /// A recipe with a build and a test step, both aborting on failure.
    pub fn simple(name: &str) -> Recipe {
        Recipe::new(name, Self::display_name(name))
            .with_repository(REPOSITORY)
            .with_build_config("linux")
            .with_step(StepDefinition::new("build", "scripts/build.sh"))
            .with_step(StepDefinition::new("test", "scripts/test.sh"))
    }

    /// A recipe whose single step may fail without failing the job.
    pub fn allowed_to_fail(name: &str) -> Recipe {
        Recipe::new(name, Self::display_name(name))
            .with_repository(REPOSITORY)
            .with_build_config("linux")
            .with_step(StepDefinition::new("lint", "scripts/lint.sh").allowed_to_fail())
    }

    fn display_name(name: &str) -> String {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Factory for creating test events.
pub struct EventFixture;

impl EventFixture {
    pub fn pull_request(number: u64) -> Event {
        Event::new(
            EventCause::PullRequest,
            GitServerKind::GitHub,
            CommitRef::new("dev", "proj", "feature", "1f2e3d4c5b6a7988"),
            CommitRef::new("org", "proj", "main", "8897a6b5c4d3e2f1"),
        )
        .with_pull_request(number)
    }

    pub fn push() -> Event {
        let head = CommitRef::new("org", "proj", "main", "aa11bb22cc33dd44");
        Event::new(EventCause::Push, GitServerKind::GitHub, head.clone(), head)
    }
}
