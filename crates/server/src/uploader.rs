//! Upload orchestration with compensating rollback.
//!
//! Each upload is a short saga over the filesystem. Every completed step
//! records how to undo itself; when a later step fails the recorded undo
//! actions run in reverse order before the original error is returned.
//!
//! ```text
//! database upload:  Start -> DirCreated -> DatabaseStored -> Done
//! sql upload:       Start -> ScriptStored -> DirCreated -> Converted -> Done
//!                     any failure -> Compensating -> Failed
//! ```

use crate::convert::Converter;
use crate::error::UploadError;
use crate::inflight::{InFlightUploads, UploadClaim};
use crate::metrics::{BYTES_STORED, CONVERSION_DURATION, record_compensation};
use sqldepot_core::layout::database_file_name;
use sqldepot_core::{Identifier, StorageLayout, UploadPaths};
use sqldepot_storage::{ByteStream, StorageError, UploadStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// A binary database stored as uploaded.
#[derive(Debug, Clone)]
pub struct StoredDatabase {
    pub id: Identifier,
    pub database_file: PathBuf,
    pub bytes: u64,
}

/// A SQL script stored and converted into a database.
#[derive(Debug, Clone)]
pub struct BuiltDatabase {
    pub id: Identifier,
    pub sql_file: PathBuf,
    pub database_name: String,
    pub database_file: PathBuf,
    pub bytes: u64,
}

/// Progress of a single upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Start,
    ScriptStored,
    DirCreated,
    DatabaseStored,
    Converted,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::ScriptStored => "script_stored",
            Stage::DirCreated => "dir_created",
            Stage::DatabaseStored => "database_stored",
            Stage::Converted => "converted",
        }
    }
}

/// How to reverse a completed step.
#[derive(Debug)]
enum Undo {
    RemoveFile(PathBuf),
    RemoveDir(PathBuf),
}

/// Completed steps of an upload, with their undo actions.
///
/// The saga owns the identifier claim. Until [`Saga::finish`] is called it
/// is armed: dropping it (a cancelled request future) hands the recorded
/// undo actions to a background task, which keeps the claim until the
/// rollback is done.
struct Saga {
    store: Arc<dyn UploadStore>,
    id: Identifier,
    claim: Option<UploadClaim>,
    stage: Stage,
    undo: Vec<Undo>,
    armed: bool,
}

impl Saga {
    fn new(store: Arc<dyn UploadStore>, claim: UploadClaim) -> Self {
        Self {
            store,
            id: claim.id().clone(),
            claim: Some(claim),
            stage: Stage::Start,
            undo: Vec::new(),
            armed: true,
        }
    }

    fn id(&self) -> &Identifier {
        &self.id
    }

    fn advance(&mut self, stage: Stage, undo: Option<Undo>) {
        tracing::debug!(
            id = %self.id,
            from = self.stage.as_str(),
            to = stage.as_str(),
            "Upload advanced"
        );
        self.stage = stage;
        self.undo.extend(undo);
    }

    /// Keep everything and release the claim.
    fn finish(mut self) {
        self.armed = false;
    }

    /// Undo every completed step, newest first.
    ///
    /// Failures are logged and counted, never returned.
    async fn compensate(mut self) {
        self.armed = false;
        let undo = std::mem::take(&mut self.undo);
        rollback(self.store.as_ref(), &self.id, self.stage, undo).await;
    }
}

impl Drop for Saga {
    fn drop(&mut self) {
        if !self.armed || self.undo.is_empty() {
            return;
        }

        let store = self.store.clone();
        let id = self.id.clone();
        let stage = self.stage;
        let undo = std::mem::take(&mut self.undo);
        let claim = self.claim.take();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(id = %id, stage = stage.as_str(), "Upload cancelled");
                handle.spawn(async move {
                    rollback(store.as_ref(), &id, stage, undo).await;
                    drop(claim);
                });
            }
            Err(_) => tracing::error!(
                id = %id,
                stage = stage.as_str(),
                steps = undo.len(),
                "Upload cancelled outside a runtime, manual cleanup required"
            ),
        }
    }
}

async fn rollback(store: &dyn UploadStore, id: &Identifier, stage: Stage, undo: Vec<Undo>) {
    tracing::warn!(
        id = %id,
        stage = stage.as_str(),
        steps = undo.len(),
        "Rolling back failed upload"
    );

    for undo in undo.into_iter().rev() {
        let (action, path, result) = match &undo {
            Undo::RemoveFile(path) => ("remove_file", path, store.remove_file(path).await),
            Undo::RemoveDir(path) => ("remove_dir", path, store.remove_dir(path).await),
        };

        match result {
            Ok(()) => {
                record_compensation(action, "ok");
                tracing::debug!(id = %id, action, path = %path.display(), "Rolled back");
            }
            Err(StorageError::NotFound(_)) => {
                record_compensation(action, "not_found");
                tracing::warn!(
                    id = %id,
                    action,
                    path = %path.display(),
                    "Rollback target already gone"
                );
            }
            Err(e) => {
                record_compensation(action, "error");
                tracing::error!(
                    id = %id,
                    action,
                    path = %path.display(),
                    error = %e,
                    "Rollback failed, manual cleanup required"
                );
            }
        }
    }
}

/// Runs the two upload operations against a store and a converter.
pub struct Uploader {
    store: Arc<dyn UploadStore>,
    converter: Arc<dyn Converter>,
    layout: StorageLayout,
    in_flight: InFlightUploads,
}

impl Uploader {
    pub fn new(
        store: Arc<dyn UploadStore>,
        converter: Arc<dyn Converter>,
        layout: StorageLayout,
    ) -> Self {
        Self {
            store,
            converter,
            layout,
            in_flight: InFlightUploads::new(),
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    #[cfg(test)]
    pub fn in_flight(&self) -> &InFlightUploads {
        &self.in_flight
    }

    /// Derive the identifier for `file_name`, claim it and start its saga.
    fn begin(&self, file_name: &str) -> Result<(Saga, UploadPaths), UploadError> {
        let (id, extension) = Identifier::from_file_name(file_name)
            .map_err(|e| UploadError::InvalidIdentifier(e.to_string()))?;

        let claim = self.in_flight.try_claim(&id).ok_or_else(|| {
            UploadError::Collision(format!(
                "An upload named {id} is already in progress. Rename your uploaded file or retry later."
            ))
        })?;

        tracing::debug!(id = %id, extension = ?extension, "Derived upload identifier");
        let paths = self.layout.paths(&id);
        Ok((Saga::new(self.store.clone(), claim), paths))
    }

    /// Store an uploaded binary database at `<database_root>/<id>/<id>.sqlite`.
    #[tracing::instrument(skip(self, data))]
    pub async fn upload_database(
        &self,
        file_name: &str,
        data: ByteStream<'_>,
    ) -> Result<StoredDatabase, UploadError> {
        let (mut saga, paths) = self.begin(file_name)?;

        self.store
            .create_dir(&paths.database_dir)
            .await
            .map_err(directory_error)?;
        saga.advance(
            Stage::DirCreated,
            Some(Undo::RemoveDir(paths.database_dir.clone())),
        );

        let bytes = match self.store.store(data, &paths.database_file).await {
            Ok(bytes) => bytes,
            Err(e) => {
                saga.compensate().await;
                return Err(store_error(e));
            }
        };
        saga.advance(Stage::DatabaseStored, None);
        BYTES_STORED.inc_by(bytes);

        tracing::info!(
            id = %saga.id(),
            bytes,
            path = %paths.database_file.display(),
            "Stored database upload"
        );

        let id = saga.id().clone();
        saga.finish();
        Ok(StoredDatabase {
            id,
            database_file: paths.database_file,
            bytes,
        })
    }

    /// Store an uploaded SQL script and build `<id>.sqlite` from it.
    #[tracing::instrument(skip(self, data))]
    pub async fn upload_sql(
        &self,
        file_name: &str,
        data: ByteStream<'_>,
    ) -> Result<BuiltDatabase, UploadError> {
        let (mut saga, paths) = self.begin(file_name)?;

        let bytes = self
            .store
            .store(data, &paths.sql_file)
            .await
            .map_err(store_error)?;
        saga.advance(
            Stage::ScriptStored,
            Some(Undo::RemoveFile(paths.sql_file.clone())),
        );

        if let Err(e) = self.store.create_dir(&paths.database_dir).await {
            saga.compensate().await;
            return Err(directory_error(e));
        }
        saga.advance(
            Stage::DirCreated,
            Some(Undo::RemoveDir(paths.database_dir.clone())),
        );

        let started = Instant::now();
        let converted = self
            .converter
            .convert(&paths.sql_file, &paths.database_file)
            .await;
        CONVERSION_DURATION.observe(started.elapsed().as_secs_f64());

        if let Err(e) = converted {
            tracing::warn!(id = %saga.id(), error = %e, "Conversion failed");
            saga.compensate().await;
            return Err(UploadError::Conversion(e));
        }
        saga.advance(Stage::Converted, None);
        BYTES_STORED.inc_by(bytes);

        tracing::info!(
            id = %saga.id(),
            bytes,
            sql_path = %paths.sql_file.display(),
            database_path = %paths.database_file.display(),
            "Built database from SQL upload"
        );

        let id = saga.id().clone();
        saga.finish();
        Ok(BuiltDatabase {
            database_name: database_file_name(&id),
            id,
            sql_file: paths.sql_file,
            database_file: paths.database_file,
            bytes,
        })
    }
}

fn store_error(e: StorageError) -> UploadError {
    match e {
        StorageError::AlreadyExists(path) => UploadError::Collision(format!(
            "File already exists at {}. Rename your uploaded file or delete the pre-existing one(s).",
            path.display()
        )),
        other => UploadError::Write(other),
    }
}

fn directory_error(e: StorageError) -> UploadError {
    match e {
        StorageError::AlreadyExists(_) => UploadError::Collision(
            "Directory creation failed. A folder using that same name has probably already been uploaded. Rename your uploaded file."
                .to_string(),
        ),
        other => UploadError::Directory(other),
    }
}
