use clap::ValueEnum;
use socbot_core::{CopyFlags, SearchKind, StatusFilter, StatusFilters};

pub mod commands;

/// Parse `--kind`; English and Portuguese names are accepted
pub fn parse_search_kind(value: &str) -> Result<SearchKind, String> {
    value.parse::<SearchKind>().map_err(|e| e.to_string())
}

/// Employment status included in the search
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    Active,
    Inactive,
    Pending,
    OnLeave,
    Vacation,
}

impl From<StatusArg> for StatusFilter {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Active => StatusFilter::Active,
            StatusArg::Inactive => StatusFilter::Inactive,
            StatusArg::Pending => StatusFilter::Pending,
            StatusArg::OnLeave => StatusFilter::OnLeave,
            StatusArg::Vacation => StatusFilter::Vacation,
        }
    }
}

/// Record part that is normally copied to the destination company
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CopyArg {
    ClinicalRecord,
    MedicalRegistration,
    VaccineHistory,
    LaborHistory,
    SocGed,
}

/// No statuses given means every status
pub fn status_filters(statuses: &[StatusArg]) -> StatusFilters {
    if statuses.is_empty() {
        return StatusFilters::default();
    }
    let statuses: Vec<StatusFilter> = statuses.iter().copied().map(StatusFilter::from).collect();
    StatusFilters::only(&statuses)
}

/// Every part copied except the excluded ones
pub fn copy_flags(excluded: &[CopyArg]) -> CopyFlags {
    let mut flags = CopyFlags::default();
    for part in excluded {
        match part {
            CopyArg::ClinicalRecord => flags.clinical_record = false,
            CopyArg::MedicalRegistration => flags.medical_registration = false,
            CopyArg::VaccineHistory => flags.vaccine_history = false,
            CopyArg::LaborHistory => flags.labor_history = false,
            CopyArg::SocGed => flags.soc_ged = false,
        }
    }
    flags
}
