use async_trait::async_trait;
use learn_core::model::{
    DayState, Enrollment, Program, ProgramId, ProgramSlug, Unit, UnitId, UserId,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Catalog programs, keyed by slug for reads.
#[async_trait]
pub trait ProgramRepository: Send + Sync {
    /// Store a new program and return its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the slug is already used.
    async fn insert_program(&self, program: &Program) -> Result<ProgramId, StorageError>;

    /// Update an existing program by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the program does not exist.
    async fn update_program(&self, program: &Program) -> Result<(), StorageError>;

    /// Fetch a program by slug.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_program(&self, slug: &ProgramSlug) -> Result<Option<Program>, StorageError>;

    /// List programs ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_programs(&self, limit: u32) -> Result<Vec<Program>, StorageError>;
}

#[async_trait]
pub trait UnitRepository: Send + Sync {
    /// Store a new unit and return its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if `(program, type, index)` is taken.
    async fn insert_unit(&self, unit: &Unit) -> Result<UnitId, StorageError>;

    /// Update an existing unit by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the unit does not exist.
    async fn update_unit(&self, unit: &Unit) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_unit(&self, id: UnitId) -> Result<Option<Unit>, StorageError>;

    /// All units of a program ordered by type then index.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_units(&self, slug: &ProgramSlug) -> Result<Vec<Unit>, StorageError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_enrollment(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
    ) -> Result<Option<Enrollment>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the enrollment cannot be stored.
    async fn upsert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError>;

    /// All enrollments of a user, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_enrollments(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError>;
}

#[async_trait]
pub trait DayStateRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_day_state(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
        day: u32,
    ) -> Result<Option<DayState>, StorageError>;

    /// Insert or replace the record for `(user, program, day)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_day_state(&self, state: &DayState) -> Result<(), StorageError>;

    /// All day records for a program, ordered by day.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_day_states(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
    ) -> Result<Vec<DayState>, StorageError>;

    /// Remove one day's record. Returns whether anything was deleted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_day_state(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
        day: u32,
    ) -> Result<bool, StorageError>;
}

/// Writes that touch both an enrollment and its day records.
///
/// Implementations apply each call atomically.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Persist a day record together with the enrollment it moved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if either write fails; neither is applied then.
    async fn commit_day(
        &self,
        state: &DayState,
        enrollment: &Enrollment,
    ) -> Result<(), StorageError>;

    /// Delete every day record of the enrollment's program and store the
    /// (already reset) enrollment. Returns the number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the transaction fails; nothing is applied then.
    async fn reset_program(&self, enrollment: &Enrollment) -> Result<u64, StorageError>;
}

type DayKey = (UserId, ProgramSlug, u32);

#[derive(Default)]
struct MemoryState {
    next_program_id: u64,
    next_unit_id: u64,
    programs: BTreeMap<ProgramId, Program>,
    units: BTreeMap<UnitId, Unit>,
    enrollments: HashMap<(UserId, ProgramSlug), Enrollment>,
    day_states: BTreeMap<DayKey, DayState>,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// A single lock guards every table so `ProgressStore` calls are atomic.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn day_key(user_id: UserId, slug: &ProgramSlug, day: u32) -> DayKey {
    (user_id, slug.clone(), day)
}

#[async_trait]
impl ProgramRepository for InMemoryRepository {
    async fn insert_program(&self, program: &Program) -> Result<ProgramId, StorageError> {
        let mut guard = self.lock()?;
        if guard.programs.values().any(|p| p.slug() == program.slug()) {
            return Err(StorageError::Conflict);
        }
        guard.next_program_id += 1;
        let id = ProgramId::new(guard.next_program_id);
        guard.programs.insert(id, program.clone().with_id(id));
        Ok(id)
    }

    async fn update_program(&self, program: &Program) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard
            .programs
            .get_mut(&program.id())
            .ok_or(StorageError::NotFound)?;
        *slot = program.clone();
        Ok(())
    }

    async fn get_program(&self, slug: &ProgramSlug) -> Result<Option<Program>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.programs.values().find(|p| p.slug() == slug).cloned())
    }

    async fn list_programs(&self, limit: u32) -> Result<Vec<Program>, StorageError> {
        let guard = self.lock()?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard.programs.values().take(limit).cloned().collect())
    }
}

#[async_trait]
impl UnitRepository for InMemoryRepository {
    async fn insert_unit(&self, unit: &Unit) -> Result<UnitId, StorageError> {
        let mut guard = self.lock()?;
        let clash = guard.units.values().any(|u| {
            u.program_slug() == unit.program_slug()
                && u.unit_type() == unit.unit_type()
                && u.unit_index() == unit.unit_index()
        });
        if clash {
            return Err(StorageError::Conflict);
        }
        guard.next_unit_id += 1;
        let id = UnitId::new(guard.next_unit_id);
        guard.units.insert(id, unit.clone().with_id(id));
        Ok(id)
    }

    async fn update_unit(&self, unit: &Unit) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard.units.get_mut(&unit.id()).ok_or(StorageError::NotFound)?;
        *slot = unit.clone();
        Ok(())
    }

    async fn get_unit(&self, id: UnitId) -> Result<Option<Unit>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.units.get(&id).cloned())
    }

    async fn list_units(&self, slug: &ProgramSlug) -> Result<Vec<Unit>, StorageError> {
        let guard = self.lock()?;
        let mut units: Vec<Unit> = guard
            .units
            .values()
            .filter(|u| u.program_slug() == slug)
            .cloned()
            .collect();
        units.sort_by_key(|u| (u.unit_type(), u.unit_index()));
        Ok(units)
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn get_enrollment(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
    ) -> Result<Option<Enrollment>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.enrollments.get(&(user_id, slug.clone())).cloned())
    }

    async fn upsert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.enrollments.insert(
            (enrollment.user_id(), enrollment.program_slug().clone()),
            enrollment.clone(),
        );
        Ok(())
    }

    async fn list_enrollments(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError> {
        let guard = self.lock()?;
        let mut found: Vec<Enrollment> = guard
            .enrollments
            .values()
            .filter(|e| e.user_id() == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.updated_at()
                .cmp(&a.updated_at())
                .then_with(|| a.program_slug().cmp(b.program_slug()))
        });
        Ok(found)
    }
}

#[async_trait]
impl DayStateRepository for InMemoryRepository {
    async fn get_day_state(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
        day: u32,
    ) -> Result<Option<DayState>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.day_states.get(&day_key(user_id, slug, day)).cloned())
    }

    async fn upsert_day_state(&self, state: &DayState) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.day_states.insert(
            day_key(state.user_id(), state.program_slug(), state.day()),
            state.clone(),
        );
        Ok(())
    }

    async fn list_day_states(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
    ) -> Result<Vec<DayState>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .day_states
            .values()
            .filter(|s| s.user_id() == user_id && s.program_slug() == slug)
            .cloned()
            .collect())
    }

    async fn delete_day_state(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
        day: u32,
    ) -> Result<bool, StorageError> {
        let mut guard = self.lock()?;
        Ok(guard
            .day_states
            .remove(&day_key(user_id, slug, day))
            .is_some())
    }
}

#[async_trait]
impl ProgressStore for InMemoryRepository {
    async fn commit_day(
        &self,
        state: &DayState,
        enrollment: &Enrollment,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.day_states.insert(
            day_key(state.user_id(), state.program_slug(), state.day()),
            state.clone(),
        );
        guard.enrollments.insert(
            (enrollment.user_id(), enrollment.program_slug().clone()),
            enrollment.clone(),
        );
        Ok(())
    }

    async fn reset_program(&self, enrollment: &Enrollment) -> Result<u64, StorageError> {
        let mut guard = self.lock()?;
        let user_id = enrollment.user_id();
        let slug = enrollment.program_slug();
        let before = guard.day_states.len();
        guard
            .day_states
            .retain(|(u, s, _), _| !(*u == user_id && s == slug));
        let deleted = before - guard.day_states.len();
        guard
            .enrollments
            .insert((user_id, slug.clone()), enrollment.clone());
        Ok(u64::try_from(deleted).unwrap_or(u64::MAX))
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub programs: Arc<dyn ProgramRepository>,
    pub units: Arc<dyn UnitRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub day_states: Arc<dyn DayStateRepository>,
    pub progress: Arc<dyn ProgressStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Wire every repository role to one backend.
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: ProgramRepository
            + UnitRepository
            + EnrollmentRepository
            + DayStateRepository
            + ProgressStore
            + Clone
            + 'static,
    {
        Self {
            programs: Arc::new(repo.clone()),
            units: Arc::new(repo.clone()),
            enrollments: Arc::new(repo.clone()),
            day_states: Arc::new(repo.clone()),
            progress: Arc::new(repo),
        }
    }
}
