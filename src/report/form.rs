//! Visit-report form state.
//!
//! One serializable accumulator per open report screen: every edit goes
//! through [`FormState::apply`], which returns the side effects the caller
//! must run instead of firing them itself. Validation and submission
//! gating live here, away from any UI framework.

use thiserror::Error;

use crate::model::{DateTimePair, ReportStatus, TypeOfCall, VisitReport};

/// Side effects a state transition asks the caller to execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Load the pending-reason options from the server.
    FetchPendingReasons,
}

/// Lifecycle of the server-provided pending-reason list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PendingReasons {
    #[default]
    NotLoaded,
    Loading,
    Loaded(Vec<String>),
    /// The fetch failed; the dropdown shows empty rather than blocking.
    Unavailable,
}

/// Field-level validation failures. Local only, never sent to the server.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("please select a work status")]
    StatusMissing,
    #[error("please enter fault reported")]
    FaultReportedMissing,
    #[error("please select type of call")]
    TypeOfCallMissing,
    #[error("please enter call attended date and time")]
    CallAttendedIncomplete,
    #[error("please enter call completed date and time")]
    CallCompletedIncomplete,
    #[error("please add a remark")]
    RemarkMissing,
    #[error("please select a pending reason")]
    PendingReasonMissing,
    #[error("please provide a signature")]
    SignatureMissing,
}

/// Edits and completions applied to the form.
#[derive(Clone, Debug)]
pub enum FormEvent {
    SetFaultReported(String),
    SetCauseProblem(String),
    SetDiagnosis(String),
    SetPartReplaced(String),
    SetMaterialTakenOut(String),
    SetRemark(String),
    SetCustomerComment(String),
    SetTypeOfCall(TypeOfCall),
    SetCallAttendedDate(String),
    SetCallAttendedTime(String),
    SetCallCompletedDate(String),
    SetCallCompletedTime(String),
    SetStatus(ReportStatus),
    SetPendingReason(String),
    /// Raster bytes taken from the signature pad at save time.
    SetSignature(Vec<u8>),
    ClearSignature,
    PendingReasonsLoaded(Vec<String>),
    PendingReasonsFailed,
}

/// All state for one visit-report screen.
#[derive(Clone, Debug)]
pub struct FormState {
    pub work_item_id: String,
    pub fault_reported: String,
    pub cause_problem: String,
    pub diagnosis: String,
    pub part_replaced: String,
    pub material_taken_out: String,
    pub remark: String,
    pub customer_comment: String,
    pub type_of_call: Option<TypeOfCall>,
    pub call_attended_at: DateTimePair,
    pub call_completed_at: DateTimePair,
    pub status: Option<ReportStatus>,
    pub pending_reason: String,
    pub signature_image: Option<Vec<u8>>,
    pub pending_reasons: PendingReasons,
}

impl FormState {
    pub fn new(work_item_id: impl Into<String>) -> Self {
        Self {
            work_item_id: work_item_id.into(),
            fault_reported: String::new(),
            cause_problem: String::new(),
            diagnosis: String::new(),
            part_replaced: String::new(),
            material_taken_out: String::new(),
            remark: String::new(),
            customer_comment: String::new(),
            type_of_call: None,
            call_attended_at: DateTimePair::default(),
            call_completed_at: DateTimePair::default(),
            status: None,
            pending_reason: String::new(),
            signature_image: None,
            pending_reasons: PendingReasons::default(),
        }
    }

    /// Apply one event and return the effects the caller must run.
    ///
    /// Selecting the pending status is the one transition with a declared
    /// effect: entering it schedules exactly one reason fetch, unless a
    /// fetch is already in flight or the list is already loaded.
    pub fn apply(&mut self, event: FormEvent) -> Vec<Effect> {
        match event {
            FormEvent::SetFaultReported(v) => self.fault_reported = v,
            FormEvent::SetCauseProblem(v) => self.cause_problem = v,
            FormEvent::SetDiagnosis(v) => self.diagnosis = v,
            FormEvent::SetPartReplaced(v) => self.part_replaced = v,
            FormEvent::SetMaterialTakenOut(v) => self.material_taken_out = v,
            FormEvent::SetRemark(v) => self.remark = v,
            FormEvent::SetCustomerComment(v) => self.customer_comment = v,
            FormEvent::SetTypeOfCall(v) => self.type_of_call = Some(v),
            FormEvent::SetCallAttendedDate(v) => self.call_attended_at.date = v,
            FormEvent::SetCallAttendedTime(v) => self.call_attended_at.time = v,
            FormEvent::SetCallCompletedDate(v) => self.call_completed_at.date = v,
            FormEvent::SetCallCompletedTime(v) => self.call_completed_at.time = v,
            FormEvent::SetPendingReason(v) => self.pending_reason = v,
            FormEvent::SetSignature(bytes) => self.signature_image = Some(bytes),
            FormEvent::ClearSignature => self.signature_image = None,
            FormEvent::PendingReasonsLoaded(list) => {
                self.pending_reasons = PendingReasons::Loaded(list);
            }
            FormEvent::PendingReasonsFailed => {
                self.pending_reasons = PendingReasons::Unavailable;
            }
            FormEvent::SetStatus(new) => {
                let entering_pending =
                    new == ReportStatus::Pending && self.status != Some(ReportStatus::Pending);
                self.status = Some(new);
                if entering_pending
                    && matches!(
                        self.pending_reasons,
                        PendingReasons::NotLoaded | PendingReasons::Unavailable
                    )
                {
                    self.pending_reasons = PendingReasons::Loading;
                    return vec![Effect::FetchPendingReasons];
                }
            }
        }
        vec![]
    }

    /// The reason options to offer; empty while loading or unavailable.
    pub fn reason_options(&self) -> &[String] {
        match &self.pending_reasons {
            PendingReasons::Loaded(list) => list,
            _ => &[],
        }
    }

    /// Check the canonical required-field policy for the selected status.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.status.is_none() {
            errors.push(FieldError::StatusMissing);
        }
        if self.fault_reported.trim().is_empty() {
            errors.push(FieldError::FaultReportedMissing);
        }
        if self.type_of_call.is_none() {
            errors.push(FieldError::TypeOfCallMissing);
        }
        if !self.call_attended_at.is_complete() {
            errors.push(FieldError::CallAttendedIncomplete);
        }
        if !self.call_completed_at.is_complete() {
            errors.push(FieldError::CallCompletedIncomplete);
        }
        if self.remark.trim().is_empty() {
            errors.push(FieldError::RemarkMissing);
        }
        if self.status == Some(ReportStatus::Pending) && self.pending_reason.trim().is_empty() {
            errors.push(FieldError::PendingReasonMissing);
        }
        if self.signature_image.is_none() {
            errors.push(FieldError::SignatureMissing);
        }
        errors
    }

    /// True once every required field for the chosen status is filled.
    pub fn is_submittable(&self) -> bool {
        self.validate().is_empty()
    }

    /// Snapshot the current fields into the transient report aggregate.
    pub fn to_report(&self) -> VisitReport {
        VisitReport {
            work_item_id: self.work_item_id.clone(),
            fault_reported: self.fault_reported.clone(),
            cause_problem: self.cause_problem.clone(),
            diagnosis: self.diagnosis.clone(),
            part_replaced: self.part_replaced.clone(),
            material_taken_out: self.material_taken_out.clone(),
            remark: self.remark.clone(),
            customer_comment: self.customer_comment.clone(),
            type_of_call: self.type_of_call,
            call_attended_at: self.call_attended_at.clone(),
            call_completed_at: self.call_completed_at.clone(),
            status: self.status,
            pending_reason: self.pending_reason.clone(),
            signature_image: self.signature_image.clone(),
        }
    }
}
