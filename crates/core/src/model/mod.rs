mod day_state;
mod enrollment;
mod ids;
mod program;
mod slug;
mod unit;

pub use day_state::{DayDraft, DayPhase, DayState, DayStateError};
pub use enrollment::{
    DayAdvance, Enrollment, EnrollmentError, EnrollmentStatus, RESET_KEYWORD, confirms_reset,
};
pub use ids::{ParseIdError, ProgramId, UnitId, UserId};
pub use program::{Program, ProgramError, PublishStatus};
pub use slug::{MAX_SLUG_LEN, ProgramSlug, SlugError, slugify, unique_slug};
pub use unit::{CheckDef, JournalSchema, QuestionDef, SliderDef, Unit, UnitError, UnitType};
