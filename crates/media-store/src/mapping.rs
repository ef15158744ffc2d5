// media-store/src/mapping.rs
// ============================================================================
// Module: Row Mapping
// Description: Converts Postgres rows to and from domain types.
// Purpose: Keep SQL column order and domain-struct shape in one place per
//          entity so the two cannot silently drift apart.
// Dependencies: media-core, postgres, serde_json
// ============================================================================

use media_core::core::content::Classification;
use media_core::core::content::ContentItem;
use media_core::core::content::Sentimiento;
use media_core::core::incident::Incident;
use media_core::core::incident::IncidentSeverity;
use media_core::core::ingestion::IngestionRun;
use media_core::core::ingestion::RunStatus;
use media_core::core::ingestion::TriggerType;
use media_core::core::query::ExecutionConfig;
use media_core::core::query::QueryDefinition;
use media_core::core::query::TrackedQuery;
use media_core::core::report::ExportJob;
use media_core::core::report::ExportJobStatus;
use media_core::core::report::ReportRun;
use media_core::core::report::ReportRunStatus;
use media_core::core::report::ReportSchedule;
use media_core::core::report::ReportScheduleFrequency;
use media_core::core::report::ReportTemplate;
use media_core::StoreError;
use postgres::Row;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::OffsetDateTime;

/// Serializes a fieldless enum to the plain string stored in a `TEXT` column.
pub(crate) fn enum_to_text<T: Serialize>(value: &T) -> Result<String, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::String(text)) => Ok(text),
        _ => Err(StoreError::Internal("enum did not serialize to a string".to_string())),
    }
}

/// Parses a fieldless enum back out of a `TEXT` column value.
pub(crate) fn enum_from_text<T: DeserializeOwned>(text: &str) -> Result<T, StoreError> {
    serde_json::from_value(Value::String(text.to_string()))
        .map_err(|err| StoreError::Internal(format!("invalid stored enum {text:?}: {err}")))
}

pub(crate) const TRACKED_QUERY_COLUMNS: &str = "id, name, language, scope, is_active, \
     max_articles_per_run, definition_json, execution_json, compiled_provider_query, \
     current_revision, updated_at";

pub(crate) fn row_to_tracked_query(row: &Row) -> Result<TrackedQuery, StoreError> {
    let scope_text: String = row.get(3);
    let definition_json: Value = row.get(6);
    let execution_json: Value = row.get(7);
    Ok(TrackedQuery {
        id: row.get::<_, String>(0).into(),
        name: row.get(1),
        language: row.get(2),
        scope: enum_from_text(&scope_text)?,
        is_active: row.get(4),
        max_articles_per_run: u32::try_from(row.get::<_, i32>(5)).unwrap_or(0),
        definition: serde_json::from_value::<QueryDefinition>(definition_json)
            .map_err(|err| StoreError::Internal(err.to_string()))?,
        execution: serde_json::from_value::<ExecutionConfig>(execution_json)
            .map_err(|err| StoreError::Internal(err.to_string()))?,
        compiled_provider_query: row.get(8),
        current_revision: u32::try_from(row.get::<_, i32>(9)).unwrap_or(0),
        updated_at: row.get(10),
    })
}

pub(crate) const CONTENT_ITEM_COLUMNS: &str = "id, canonical_url, source_type, term_id, \
     provider, source_name, source_id, title, summary, content, image_url, language, category, \
     published_at, source_score, raw_payload_s3_key, state, categoria, sentimiento, \
     metadata_json, created_at, updated_at";

pub(crate) fn row_to_content_item(row: &Row) -> Result<ContentItem, StoreError> {
    let source_type_text: String = row.get(2);
    let state_text: String = row.get(16);
    let sentimiento_text: Option<String> = row.get(18);
    let term_id: Option<String> = row.get(3);
    Ok(ContentItem {
        id: row.get::<_, String>(0).into(),
        canonical_url: row.get(1),
        source_type: enum_from_text(&source_type_text)?,
        term_id: term_id.map(Into::into),
        provider: row.get(4),
        source_name: row.get(5),
        source_id: row.get(6),
        title: row.get(7),
        summary: row.get(8),
        content: row.get(9),
        image_url: row.get(10),
        language: row.get(11),
        category: row.get(12),
        published_at: row.get::<_, Option<OffsetDateTime>>(13),
        source_score: row.get(14),
        raw_payload_s3_key: row.get(15),
        state: enum_from_text(&state_text)?,
        categoria: row.get(17),
        sentimiento: sentimiento_text.map(|text| enum_from_text(&text)).transpose()?,
        metadata: row.get(19),
        created_at: row.get(20),
        updated_at: row.get(21),
    })
}

pub(crate) const CLASSIFICATION_COLUMNS: &str = "id, content_item_id, prompt_version, \
     model_id, categoria, sentimiento, etiquetas_json, confianza, resumen, is_override, \
     overridden_by_user_id, override_reason, created_at, updated_at";

pub(crate) fn row_to_classification(row: &Row) -> Result<Classification, StoreError> {
    let sentimiento_text: String = row.get(5);
    let etiquetas_json: Value = row.get(6);
    let overridden_by: Option<String> = row.get(10);
    Ok(Classification {
        id: row.get::<_, String>(0).into(),
        content_item_id: row.get::<_, String>(1).into(),
        prompt_version: row.get(2),
        model_id: row.get(3),
        categoria: row.get(4),
        sentimiento: enum_from_text::<Sentimiento>(&sentimiento_text)?,
        etiquetas: serde_json::from_value(etiquetas_json)
            .map_err(|err| StoreError::Internal(err.to_string()))?,
        confianza: row.get(7),
        resumen: row.get(8),
        is_override: row.get(9),
        overridden_by_user_id: overridden_by.map(Into::into),
        override_reason: row.get(11),
        created_at: row.get(12),
        updated_at: row.get(13),
    })
}

pub(crate) const INCIDENT_COLUMNS: &str = "id, scope, status, severity, risk_score, \
     classified_items, owner_user_id, sla_due_at, cooldown_until, signal_version, payload_json, \
     created_at, updated_at, resolved_at";

pub(crate) fn row_to_incident(row: &Row) -> Result<Incident, StoreError> {
    let scope_text: String = row.get(1);
    let status_text: String = row.get(2);
    let severity_text: String = row.get(3);
    let owner: Option<String> = row.get(6);
    Ok(Incident {
        id: row.get::<_, String>(0).into(),
        scope: enum_from_text(&scope_text)?,
        status: enum_from_text(&status_text)?,
        severity: enum_from_text::<IncidentSeverity>(&severity_text)?,
        risk_score: row.get(4),
        classified_items: u32::try_from(row.get::<_, i32>(5)).unwrap_or(0),
        owner_user_id: owner.map(Into::into),
        sla_due_at: row.get(7),
        cooldown_until: row.get(8),
        signal_version: row.get(9),
        payload: row.get(10),
        created_at: row.get(11),
        updated_at: row.get(12),
        resolved_at: row.get(13),
    })
}

pub(crate) const INGESTION_RUN_COLUMNS: &str = "id, status, trigger_type, language, \
     effective_max_articles_per_term, request_id, started_at, finished_at, metrics_json, \
     error_message";

pub(crate) fn row_to_ingestion_run(row: &Row) -> Result<IngestionRun, StoreError> {
    let status_text: String = row.get(1);
    let trigger_text: String = row.get(2);
    let request_id: Option<String> = row.get(5);
    Ok(IngestionRun {
        id: row.get::<_, String>(0).into(),
        status: enum_from_text::<RunStatus>(&status_text)?,
        trigger_type: enum_from_text::<TriggerType>(&trigger_text)?,
        language: row.get(3),
        effective_max_articles_per_term: u32::try_from(row.get::<_, i32>(4)).unwrap_or(0),
        request_id: request_id.map(Into::into),
        started_at: row.get(6),
        finished_at: row.get(7),
        metrics: row.get(8),
        error_message: row.get(9),
    })
}

pub(crate) const REPORT_TEMPLATE_COLUMNS: &str =
    "id, name, sections_json, filters_json, confidence_threshold, is_active";

pub(crate) fn row_to_report_template(row: &Row) -> Result<ReportTemplate, StoreError> {
    let sections_json: Value = row.get(2);
    Ok(ReportTemplate {
        id: row.get::<_, String>(0).into(),
        name: row.get(1),
        sections: serde_json::from_value(sections_json)
            .map_err(|err| StoreError::Internal(err.to_string()))?,
        filters: row.get(3),
        confidence_threshold: row.get(4),
        is_active: row.get(5),
    })
}

pub(crate) const REPORT_SCHEDULE_COLUMNS: &str = "id, template_id, frequency, day_of_week, \
     time_local, timezone, recipients_json, next_run_at, last_run_at, enabled";

pub(crate) fn row_to_report_schedule(row: &Row) -> Result<ReportSchedule, StoreError> {
    let frequency_text: String = row.get(2);
    let day_of_week: Option<i16> = row.get(3);
    let recipients_json: Value = row.get(6);
    Ok(ReportSchedule {
        id: row.get::<_, String>(0).into(),
        template_id: row.get::<_, String>(1).into(),
        frequency: enum_from_text::<ReportScheduleFrequency>(&frequency_text)?,
        day_of_week: day_of_week.map(|value| u8::try_from(value).unwrap_or(0)),
        time_local: row.get(4),
        timezone: row.get(5),
        recipients: serde_json::from_value(recipients_json)
            .map_err(|err| StoreError::Internal(err.to_string()))?,
        next_run_at: row.get(7),
        last_run_at: row.get(8),
        enabled: row.get(9),
    })
}

pub(crate) const REPORT_RUN_COLUMNS: &str = "id, template_id, schedule_id, status, confidence, \
     summary, recommendations_json, blocked_reason, export_job_id, idempotency_key, request_id, \
     requested_by_user_id, started_at, finished_at";

pub(crate) fn row_to_report_run(row: &Row) -> Result<ReportRun, StoreError> {
    let status_text: String = row.get(3);
    let schedule_id: Option<String> = row.get(2);
    let recommendations_json: Value = row.get(6);
    let export_job_id: Option<String> = row.get(8);
    let request_id: Option<String> = row.get(10);
    let requested_by: Option<String> = row.get(11);
    Ok(ReportRun {
        id: row.get::<_, String>(0).into(),
        template_id: row.get::<_, String>(1).into(),
        schedule_id: schedule_id.map(Into::into),
        status: enum_from_text::<ReportRunStatus>(&status_text)?,
        confidence: row.get(4),
        summary: row.get(5),
        recommendations: serde_json::from_value(recommendations_json)
            .map_err(|err| StoreError::Internal(err.to_string()))?,
        blocked_reason: row.get(7),
        export_job_id: export_job_id.map(Into::into),
        idempotency_key: row.get(9),
        request_id: request_id.map(Into::into),
        requested_by_user_id: requested_by.map(Into::into),
        started_at: row.get(12),
        finished_at: row.get(13),
    })
}

pub(crate) const EXPORT_JOB_COLUMNS: &str =
    "id, filters_json, status, row_count, s3_key, requested_by_user_id";

pub(crate) fn row_to_export_job(row: &Row) -> Result<ExportJob, StoreError> {
    let status_text: String = row.get(2);
    let row_count: Option<i64> = row.get(3);
    let requested_by: Option<String> = row.get(5);
    Ok(ExportJob {
        id: row.get::<_, String>(0).into(),
        filters: row.get(1),
        status: enum_from_text::<ExportJobStatus>(&status_text)?,
        row_count: row_count.map(|value| u64::try_from(value).unwrap_or(0)),
        s3_key: row.get(4),
        requested_by_user_id: requested_by.map(Into::into),
    })
}
