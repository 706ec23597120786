use std::sync::Arc;

use learn_core::model::{
    JournalSchema, ProgramSlug, QuestionDef, SliderDef, UnitId, UnitType, UserId,
};
use learn_core::time::fixed_clock;
use storage::repository::Storage;

use crate::catalog_service::{CatalogService, NewUnit};
use crate::progress::{JournalService, ProgressService};
use crate::Clock;

pub(crate) const USER: UserId = UserId::new(7);

pub(crate) fn journal() -> JournalSchema {
    JournalSchema {
        sliders: vec![SliderDef {
            key: "calme".into(),
            label: "Calme".into(),
            min: 0.0,
            max: 10.0,
        }],
        questions: vec![QuestionDef {
            key: "intention".into(),
            label: "Intention du jour".into(),
            required: true,
        }],
        checks: vec![],
    }
}

/// In-memory storage holding one program titled "Programme test".
pub(crate) struct Fixture {
    pub storage: Storage,
    pub clock: Clock,
    pub slug: ProgramSlug,
    pub day_ids: Vec<UnitId>,
}

impl Fixture {
    /// A published program with `days` published day units.
    pub async fn with_program(days: u32) -> Self {
        Self::build(days, true).await
    }

    /// A program that was never published.
    pub async fn with_draft_program() -> Self {
        Self::build(2, false).await
    }

    async fn build(days: u32, publish: bool) -> Self {
        let storage = Storage::in_memory();
        let clock = fixed_clock();
        let catalog = CatalogService::new(
            clock,
            Arc::clone(&storage.programs),
            Arc::clone(&storage.units),
        );
        let program = catalog.create_program("Programme test", None).await.unwrap();
        let slug = program.slug().clone();
        let mut day_ids = Vec::new();
        for index in 1..=days {
            let unit = catalog
                .add_unit(
                    &slug,
                    NewUnit {
                        unit_type: UnitType::Day,
                        unit_index: index,
                        title: format!("Jour {index}"),
                        journal: journal(),
                    },
                )
                .await
                .unwrap();
            if publish {
                catalog.publish_unit(unit.id()).await.unwrap();
            }
            day_ids.push(unit.id());
        }
        if publish {
            catalog.publish_program(&slug).await.unwrap();
        }
        Self {
            storage,
            clock,
            slug,
            day_ids,
        }
    }

    pub fn progress(&self) -> ProgressService {
        ProgressService::new(
            self.clock,
            Arc::clone(&self.storage.programs),
            Arc::clone(&self.storage.units),
            Arc::clone(&self.storage.enrollments),
            Arc::clone(&self.storage.day_states),
            Arc::clone(&self.storage.progress),
        )
    }

    pub fn journal(&self) -> JournalService {
        JournalService::new(
            self.clock,
            Arc::clone(&self.storage.programs),
            Arc::clone(&self.storage.units),
            Arc::clone(&self.storage.enrollments),
            Arc::clone(&self.storage.day_states),
            Arc::clone(&self.storage.progress),
        )
    }

    /// Unit id of the 1-based `day`.
    pub fn day(&self, day: u32) -> UnitId {
        self.day_ids[usize::try_from(day - 1).unwrap()]
    }
}
