//! Operational stats payloads surfaced by the document storage engine.
//!
//! Each payload is a plain record with every field populated by the caller.
//! When decoded, omitted fields take their zero value and unknown fields are
//! rejected, so a misspelled field never passes as a valid record.
//! [`StatsRecord`] is the tagged union handed to stats loggers; it is
//! `#[non_exhaustive]` so new kinds can be added without breaking downstream
//! logger implementations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result code reported by the storage engine for a completed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCode {
    /// Operation succeeded.
    #[default]
    Ok,
    /// Unclassified failure.
    UnknownError,
    /// Engine-internal failure.
    InternalError,
    /// Caller supplied an invalid argument.
    InvalidArgument,
    /// Storage I/O failure.
    IoError,
    /// Storage quota exhausted.
    OutOfSpace,
    /// Requested entity does not exist.
    NotFound,
    /// Schema rejected.
    InvalidSchema,
    /// Caller lacks access.
    SecurityError,
}

impl ResultCode {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::UnknownError => "unknown_error",
            Self::InternalError => "internal_error",
            Self::InvalidArgument => "invalid_argument",
            Self::IoError => "io_error",
            Self::OutOfSpace => "out_of_space",
            Self::NotFound => "not_found",
            Self::InvalidSchema => "invalid_schema",
            Self::SecurityError => "security_error",
        }
    }

    /// Returns true for [`ResultCode::Ok`].
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// API call measured by [`CallStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    /// Unknown call.
    #[default]
    Unknown,
    /// Storage initialization.
    Initialize,
    /// Schema update.
    SetSchema,
    /// Batched document put.
    PutDocuments,
    /// Batched document get.
    GetDocuments,
    /// Batched removal by id.
    RemoveDocumentsById,
    /// Single document put.
    PutDocument,
    /// Single document get.
    GetDocument,
    /// Single removal by id.
    RemoveDocumentById,
    /// Search within one database.
    Search,
    /// Storage compaction.
    Optimize,
    /// Flush to disk.
    Flush,
    /// Search across databases.
    GlobalSearch,
    /// Batched removal by query.
    RemoveDocumentsBySearch,
}

/// Why a storage component had to be recovered during initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryCause {
    /// No recovery was needed.
    #[default]
    None,
    /// Data loss detected.
    DataLoss,
    /// Component disagreed with the ground truth store.
    InconsistentWithGroundTruth,
    /// Checksum over the stored data did not match.
    TotalChecksumMismatch,
    /// I/O failure while reading the component.
    IoError,
    /// Schema changed without the component being updated.
    SchemaChangesOutOfSync,
}

/// Integrity of the document store observed during initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStoreDataStatus {
    /// Nothing was lost.
    #[default]
    NoDataLoss,
    /// Some documents were lost.
    PartialLoss,
    /// All documents were lost.
    CompleteLoss,
}

/// Which databases a search could see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityScope {
    /// Not reported.
    #[default]
    Unknown,
    /// Caller's own databases.
    Local,
    /// Every database visible to the caller.
    Global,
}

/// Ranking strategy requested for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingStrategy {
    /// No ranking.
    #[default]
    None,
    /// Document score set by the writer.
    DocumentScore,
    /// Creation timestamp.
    CreationTimestamp,
    /// Query relevance.
    RelevanceScore,
    /// Usage count.
    UsageCount,
    /// Last-used timestamp.
    UsageLastUsedTimestamp,
}

/// Shape of a remove request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteType {
    /// Not reported.
    #[default]
    Unknown,
    /// Removal by document id.
    Id,
    /// Removal by query.
    Query,
    /// Removal of a whole namespace.
    Namespace,
    /// Removal of a whole schema type.
    SchemaType,
}

/// Stats for a single API call, measured at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CallStats {
    /// Calling package.
    pub package_name: Box<str>,
    /// Target database.
    pub database: Box<str>,
    /// Outcome.
    pub status_code: ResultCode,
    /// End-to-end latency.
    pub total_latency_millis: u64,
    /// Call being measured.
    pub call_type: CallType,
    /// Estimated IPC overhead.
    pub estimated_binder_latency_millis: u64,
    /// Operations in the call that succeeded.
    pub num_operations_succeeded: u32,
    /// Operations in the call that failed.
    pub num_operations_failed: u32,
}

/// Stats for storing one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PutDocumentStats {
    /// Calling package.
    pub package_name: Box<str>,
    /// Target database.
    pub database: Box<str>,
    /// Outcome.
    pub status_code: ResultCode,
    /// End-to-end latency.
    pub total_latency_millis: u64,
    /// Time spent converting the document to its storage form.
    pub generate_document_proto_latency_millis: u64,
    /// Time spent prefixing schema types.
    pub rewrite_document_types_latency_millis: u64,
    /// Time spent inside the native engine.
    pub native_latency_millis: u64,
    /// Native document store time.
    pub native_document_store_latency_millis: u64,
    /// Native indexing time.
    pub native_index_latency_millis: u64,
    /// Native index merge time.
    pub native_index_merge_latency_millis: u64,
    /// Stored document size.
    pub native_document_size_bytes: u64,
    /// Tokens indexed.
    pub native_num_tokens_indexed: u32,
    /// Whether the token limit was hit.
    pub native_exceeded_max_num_tokens: bool,
}

/// Stats for storage initialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct InitializeStats {
    /// Outcome.
    pub status_code: ResultCode,
    /// End-to-end latency.
    pub total_latency_millis: u64,
    /// Whether the in-memory and on-disk views diverged.
    pub has_de_sync: bool,
    /// Time preparing schema and namespace caches.
    pub prepare_schema_and_namespaces_latency_millis: u64,
    /// Time preparing the visibility store.
    pub prepare_visibility_store_latency_millis: u64,
    /// Time spent inside the native engine.
    pub native_latency_millis: u64,
    /// Why the document store was recovered.
    pub document_store_recovery_cause: RecoveryCause,
    /// Why the index was restored.
    pub index_restoration_cause: RecoveryCause,
    /// Why the schema store was recovered.
    pub schema_store_recovery_cause: RecoveryCause,
    /// Document store recovery time.
    pub document_store_recovery_latency_millis: u64,
    /// Index restoration time.
    pub index_restoration_latency_millis: u64,
    /// Schema store recovery time.
    pub schema_store_recovery_latency_millis: u64,
    /// Document store integrity.
    pub document_store_data_status: DocumentStoreDataStatus,
    /// Documents present after initialization.
    pub num_documents: u32,
    /// Schema types present after initialization.
    pub num_schema_types: u32,
    /// Whether storage had to be reset.
    pub has_reset: bool,
    /// Outcome of the reset, when one happened.
    pub reset_status_code: ResultCode,
}

/// Stats for a search query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SearchStats {
    /// Calling package.
    pub package_name: Box<str>,
    /// Target database (empty for global searches).
    pub database: Box<str>,
    /// Outcome.
    pub status_code: ResultCode,
    /// End-to-end latency.
    pub total_latency_millis: u64,
    /// Databases visible to the query.
    pub visibility_scope: VisibilityScope,
    /// Time spent inside the native engine.
    pub native_latency_millis: u64,
    /// Terms in the query.
    pub term_count: u32,
    /// Query length in characters.
    pub query_length: u32,
    /// Namespaces the query was restricted to.
    pub filtered_namespace_count: u32,
    /// Schema types the query was restricted to.
    pub filtered_schema_type_count: u32,
    /// Requested page size.
    pub requested_page_size: u32,
    /// Results on the returned page.
    pub current_page_returned_result_count: u32,
    /// Whether this was the first page.
    pub is_first_page: bool,
    /// Ranking used.
    pub ranking_strategy: RankingStrategy,
    /// Documents scored.
    pub scored_document_count: u32,
    /// Scoring time.
    pub scoring_latency_millis: u64,
    /// Ranking time.
    pub ranking_latency_millis: u64,
    /// Document fetch time.
    pub document_retrieving_latency_millis: u64,
    /// Results carrying snippets.
    pub result_with_snippets_count: u32,
}

/// Stats for a remove request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct RemoveStats {
    /// Calling package.
    pub package_name: Box<str>,
    /// Target database.
    pub database: Box<str>,
    /// Outcome.
    pub status_code: ResultCode,
    /// End-to-end latency.
    pub total_latency_millis: u64,
    /// Time spent inside the native engine.
    pub native_latency_millis: u64,
    /// How documents were selected for removal.
    pub delete_type: DeleteType,
    /// Documents removed.
    pub deleted_document_count: u32,
}

/// Stats for storage compaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct OptimizeStats {
    /// Outcome.
    pub status_code: ResultCode,
    /// End-to-end latency.
    pub total_latency_millis: u64,
    /// Time spent inside the native engine.
    pub native_latency_millis: u64,
    /// Document store compaction time.
    pub document_store_optimize_latency_millis: u64,
    /// Index rebuild time.
    pub index_restoration_latency_millis: u64,
    /// Documents before compaction.
    pub original_document_count: u32,
    /// Deleted documents purged.
    pub deleted_document_count: u32,
    /// Expired documents purged.
    pub expired_document_count: u32,
    /// Storage size before compaction.
    pub storage_size_before_bytes: u64,
    /// Storage size after compaction.
    pub storage_size_after_bytes: u64,
    /// Time since the previous compaction.
    pub time_since_last_optimize_millis: u64,
}

/// Stats for a schema update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SetSchemaStats {
    /// Calling package.
    pub package_name: Box<str>,
    /// Target database.
    pub database: Box<str>,
    /// Outcome.
    pub status_code: ResultCode,
    /// End-to-end latency.
    pub total_latency_millis: u64,
    /// Schema types added.
    pub new_type_count: u32,
    /// Types changed compatibly.
    pub compatible_type_change_count: u32,
    /// Types whose change forced reindexing.
    pub index_incompatible_type_change_count: u32,
    /// Types changed incompatibly.
    pub backwards_incompatible_type_change_count: u32,
    /// Types removed.
    pub deleted_type_count: u32,
    /// Documents migrated to the new schema.
    pub migrated_document_count: u32,
}

/// Discriminant of a [`StatsRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum StatsKind {
    /// [`CallStats`].
    Call,
    /// [`PutDocumentStats`].
    PutDocument,
    /// [`InitializeStats`].
    Initialize,
    /// [`SearchStats`].
    Search,
    /// [`RemoveStats`].
    Remove,
    /// [`OptimizeStats`].
    Optimize,
    /// [`SetSchemaStats`].
    SetSchema,
}

impl StatsKind {
    /// Number of defined kinds.
    pub const COUNT: usize = 7;

    /// Every defined kind, in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Call,
        Self::PutDocument,
        Self::Initialize,
        Self::Search,
        Self::Remove,
        Self::Optimize,
        Self::SetSchema,
    ];

    /// Dense index in `0..COUNT`, stable for the lifetime of the process.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Call => 0,
            Self::PutDocument => 1,
            Self::Initialize => 2,
            Self::Search => 3,
            Self::Remove => 4,
            Self::Optimize => 5,
            Self::SetSchema => 6,
        }
    }

    /// Stable snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::PutDocument => "put_document",
            Self::Initialize => "initialize",
            Self::Search => "search",
            Self::Remove => "remove",
            Self::Optimize => "optimize",
            Self::SetSchema => "set_schema",
        }
    }

    /// Parse a label produced by [`StatsKind::as_str`].
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
    }
}

impl fmt::Display for StatsKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Tagged union of every stats payload a logger accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum StatsRecord {
    /// API call stats.
    Call(CallStats),
    /// Document put stats.
    PutDocument(PutDocumentStats),
    /// Initialization stats.
    Initialize(InitializeStats),
    /// Search stats.
    Search(SearchStats),
    /// Remove stats.
    Remove(RemoveStats),
    /// Compaction stats.
    Optimize(OptimizeStats),
    /// Schema update stats.
    SetSchema(SetSchemaStats),
}

impl StatsRecord {
    /// Discriminant of this record.
    #[must_use]
    pub const fn kind(&self) -> StatsKind {
        match self {
            Self::Call(_) => StatsKind::Call,
            Self::PutDocument(_) => StatsKind::PutDocument,
            Self::Initialize(_) => StatsKind::Initialize,
            Self::Search(_) => StatsKind::Search,
            Self::Remove(_) => StatsKind::Remove,
            Self::Optimize(_) => StatsKind::Optimize,
            Self::SetSchema(_) => StatsKind::SetSchema,
        }
    }

    /// Outcome of the measured operation.
    #[must_use]
    pub const fn status_code(&self) -> ResultCode {
        match self {
            Self::Call(stats) => stats.status_code,
            Self::PutDocument(stats) => stats.status_code,
            Self::Initialize(stats) => stats.status_code,
            Self::Search(stats) => stats.status_code,
            Self::Remove(stats) => stats.status_code,
            Self::Optimize(stats) => stats.status_code,
            Self::SetSchema(stats) => stats.status_code,
        }
    }

    /// End-to-end latency of the measured operation.
    #[must_use]
    pub const fn total_latency_millis(&self) -> u64 {
        match self {
            Self::Call(stats) => stats.total_latency_millis,
            Self::PutDocument(stats) => stats.total_latency_millis,
            Self::Initialize(stats) => stats.total_latency_millis,
            Self::Search(stats) => stats.total_latency_millis,
            Self::Remove(stats) => stats.total_latency_millis,
            Self::Optimize(stats) => stats.total_latency_millis,
            Self::SetSchema(stats) => stats.total_latency_millis,
        }
    }

    /// Calling package, for package-scoped kinds.
    #[must_use]
    pub fn package_name(&self) -> Option<&str> {
        match self {
            Self::Call(stats) => Some(&stats.package_name),
            Self::PutDocument(stats) => Some(&stats.package_name),
            Self::Search(stats) => Some(&stats.package_name),
            Self::Remove(stats) => Some(&stats.package_name),
            Self::SetSchema(stats) => Some(&stats.package_name),
            Self::Initialize(_) | Self::Optimize(_) => None,
        }
    }
}

macro_rules! impl_from_stats {
    ($($payload:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$payload> for StatsRecord {
                fn from(stats: $payload) -> Self {
                    Self::$variant(stats)
                }
            }
        )+
    };
}

impl_from_stats! {
    CallStats => Call,
    PutDocumentStats => PutDocument,
    InitializeStats => Initialize,
    SearchStats => Search,
    RemoveStats => Remove,
    OptimizeStats => Optimize,
    SetSchemaStats => SetSchema,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn kind_indices_are_dense_and_ordered() {
        for (position, kind) in StatsKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), position);
        }
    }

    #[test]
    fn kind_labels_round_trip() {
        for kind in StatsKind::ALL {
            assert_eq!(StatsKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(StatsKind::parse(" Put-Document "), Some(StatsKind::PutDocument));
        assert_eq!(StatsKind::parse("flush"), None);
    }

    #[test]
    fn record_accessors_cover_every_variant() {
        let records: Vec<StatsRecord> = vec![
            CallStats {
                total_latency_millis: 1,
                ..CallStats::default()
            }
            .into(),
            PutDocumentStats {
                total_latency_millis: 2,
                ..PutDocumentStats::default()
            }
            .into(),
            InitializeStats {
                total_latency_millis: 3,
                ..InitializeStats::default()
            }
            .into(),
            SearchStats {
                total_latency_millis: 4,
                ..SearchStats::default()
            }
            .into(),
            RemoveStats {
                total_latency_millis: 5,
                ..RemoveStats::default()
            }
            .into(),
            OptimizeStats {
                total_latency_millis: 6,
                ..OptimizeStats::default()
            }
            .into(),
            SetSchemaStats {
                total_latency_millis: 7,
                ..SetSchemaStats::default()
            }
            .into(),
        ];

        let kinds: Vec<StatsKind> = records.iter().map(StatsRecord::kind).collect();
        assert_eq!(kinds, StatsKind::ALL.to_vec());

        let latencies: Vec<u64> = records
            .iter()
            .map(StatsRecord::total_latency_millis)
            .collect();
        assert_eq!(latencies, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(records.iter().all(|record| record.status_code().is_ok()));
    }

    #[test]
    fn package_name_only_for_package_scoped_kinds() {
        let search: StatsRecord = SearchStats {
            package_name: "com.example.mail".into(),
            ..SearchStats::default()
        }
        .into();
        assert_eq!(search.package_name(), Some("com.example.mail"));

        let optimize: StatsRecord = OptimizeStats::default().into();
        assert_eq!(optimize.package_name(), None);
    }

    #[test]
    fn record_serialization_shape() -> Result<(), Box<dyn Error>> {
        let record: StatsRecord = RemoveStats {
            package_name: "com.example.notes".into(),
            database: "main".into(),
            status_code: ResultCode::NotFound,
            total_latency_millis: 12,
            native_latency_millis: 9,
            delete_type: DeleteType::Query,
            deleted_document_count: 0,
        }
        .into();

        let value = serde_json::to_value(&record)?;
        let expected = serde_json::json!({
            "kind": "remove",
            "packageName": "com.example.notes",
            "database": "main",
            "statusCode": "not_found",
            "totalLatencyMillis": 12,
            "nativeLatencyMillis": 9,
            "deleteType": "query",
            "deletedDocumentCount": 0
        });
        assert_eq!(value, expected);

        let parsed: StatsRecord = serde_json::from_value(value)?;
        assert_eq!(parsed, record);
        Ok(())
    }

    #[test]
    fn misspelled_fields_are_rejected() {
        let typo = serde_json::from_str::<StatsRecord>(
            r#"{"kind":"call","totalLatencyMs":900,"statusCod":"io_error"}"#,
        );
        assert!(typo.is_err());

        let unknown = serde_json::from_str::<StatsRecord>(
            r#"{"kind":"optimize","totalLatencyMillis":40,"compactedBytes":1}"#,
        );
        assert!(unknown.is_err());
    }

    #[test]
    fn omitted_fields_take_zero_values() -> Result<(), Box<dyn Error>> {
        let parsed: StatsRecord =
            serde_json::from_str(r#"{"kind":"optimize","totalLatencyMillis":40}"#)?;
        let StatsRecord::Optimize(stats) = parsed else {
            return Err("expected optimize record".into());
        };
        assert_eq!(stats.total_latency_millis, 40);
        assert_eq!(stats.status_code, ResultCode::Ok);
        Ok(())
    }
}
