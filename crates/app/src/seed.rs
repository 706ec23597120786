//! Sample content for local development.

use learn_core::model::{
    CheckDef, JournalSchema, ProgramSlug, QuestionDef, SliderDef, UnitType, slugify,
};
use services::{CatalogError, CatalogService, NewUnit};
use tracing::info;

pub const SAMPLE_TITLE: &str = "Sept jours pour ralentir";

const DAY_THEMES: [&str; 7] = [
    "Respirer",
    "Observer",
    "Marcher",
    "Écouter",
    "Remercier",
    "Lâcher prise",
    "Rayonner",
];

fn day_journal() -> JournalSchema {
    JournalSchema {
        sliders: vec![
            SliderDef {
                key: "energie".into(),
                label: "Niveau d'énergie".into(),
                min: 0.0,
                max: 10.0,
            },
            SliderDef {
                key: "stress".into(),
                label: "Niveau de stress".into(),
                min: 0.0,
                max: 10.0,
            },
        ],
        questions: vec![
            QuestionDef {
                key: "ressenti".into(),
                label: "Qu'as-tu ressenti pendant la pratique ?".into(),
                required: true,
            },
            QuestionDef {
                key: "intention".into(),
                label: "Quelle intention pour demain ?".into(),
                required: false,
            },
        ],
        checks: vec![CheckDef {
            key: "mantra".into(),
            label: "Mantra répété trois fois".into(),
        }],
    }
}

/// Create and publish the sample program unless it already exists.
///
/// Returns the slug of the program created, or `None` when it was there.
pub async fn seed_sample_program(
    catalog: &CatalogService,
) -> Result<Option<ProgramSlug>, CatalogError> {
    let slug = slugify(SAMPLE_TITLE)?;
    match catalog.get_program(&slug).await {
        Ok(_) => {
            info!(program = %slug, "sample program already present");
            return Ok(None);
        }
        Err(CatalogError::ProgramNotFound(_)) => {}
        Err(e) => return Err(e),
    }

    let program = catalog
        .create_program(
            SAMPLE_TITLE,
            Some("Une semaine de courtes pratiques guidées, avec un journal quotidien.".into()),
        )
        .await?;
    let slug = program.slug().clone();

    let mut units = vec![NewUnit {
        unit_type: UnitType::Intro,
        unit_index: 1,
        title: "Bienvenue".into(),
        journal: JournalSchema::default(),
    }];
    units.extend(DAY_THEMES.iter().zip(1_u32..).map(|(theme, index)| NewUnit {
        unit_type: UnitType::Day,
        unit_index: index,
        title: format!("Jour {index} · {theme}"),
        journal: day_journal(),
    }));
    units.push(NewUnit {
        unit_type: UnitType::Conclusion,
        unit_index: 1,
        title: "Et maintenant ?".into(),
        journal: JournalSchema::default(),
    });

    for new_unit in units {
        let unit = catalog.add_unit(&slug, new_unit).await?;
        catalog.publish_unit(unit.id()).await?;
    }
    catalog.publish_program(&slug).await?;
    info!(program = %slug, days = DAY_THEMES.len(), "sample program seeded");
    Ok(Some(slug))
}

#[cfg(test)]
mod tests {
    use super::*;

    use learn_core::time::fixed_clock;
    use services::{AppServices, ServiceOptions};

    #[tokio::test]
    async fn seeding_twice_creates_one_program() {
        let services = AppServices::in_memory(fixed_clock(), ServiceOptions::default());
        let catalog = services.catalog();

        let slug = seed_sample_program(&catalog).await.unwrap().expect("created");
        assert_eq!(slug.as_str(), "sept-jours-pour-ralentir");
        assert_eq!(seed_sample_program(&catalog).await.unwrap(), None);

        let days = catalog.published_days(&slug).await.unwrap();
        assert_eq!(days.len(), 7);

        let plan = services.progress().plan(&slug, None).await.unwrap();
        assert_eq!(plan.len(), 7);
        assert!(plan[0].title.starts_with("Jour 1"));
    }
}
