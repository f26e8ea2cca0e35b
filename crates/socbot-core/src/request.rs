//! Transfer request model.
//!
//! A [`TransferRequest`] describes one "transfer employee between companies" run: how to find
//! the source record, which status filters to apply, where the employee goes, and which parts
//! of the record get copied along.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Field used to search for the employee record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchKind {
    Name,
    Code,
    Rg,
    Cpf,
    Registration,
    Pis,
    HrRegistration,
    SocialName,
}

impl SearchKind {
    pub const ALL: [SearchKind; 8] = [
        SearchKind::Name,
        SearchKind::Code,
        SearchKind::Rg,
        SearchKind::Cpf,
        SearchKind::Registration,
        SearchKind::Pis,
        SearchKind::HrRegistration,
        SearchKind::SocialName,
    ];

    /// Value of the `codigoPesquisaFuncionario` radio on the employee screen
    pub fn radio_value(&self) -> &'static str {
        match self {
            SearchKind::Name => "0",
            SearchKind::Code => "1",
            SearchKind::Rg => "2",
            SearchKind::Cpf => "3",
            SearchKind::Registration => "4",
            SearchKind::Pis => "5",
            SearchKind::HrRegistration => "6",
            SearchKind::SocialName => "8",
        }
    }

    /// Radio button id used by the destination-employee popup.
    ///
    /// The popup has its own id scheme and no radio for every kind; `None` means the popup
    /// search runs with whatever kind it defaults to.
    pub fn popup_radio_id(&self) -> Option<&'static str> {
        match self {
            SearchKind::Name => Some("rbNome"),
            SearchKind::Code => Some("rbCodigo"),
            SearchKind::Rg => Some("rbRG"),
            SearchKind::Cpf => Some("rbCPF"),
            SearchKind::Registration => Some("rbMatricula"),
            SearchKind::Pis => Some("rbNit"),
            SearchKind::HrRegistration | SearchKind::SocialName => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Name => "name",
            SearchKind::Code => "code",
            SearchKind::Rg => "rg",
            SearchKind::Cpf => "cpf",
            SearchKind::Registration => "registration",
            SearchKind::Pis => "pis",
            SearchKind::HrRegistration => "hr-registration",
            SearchKind::SocialName => "social-name",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        match normalized.as_str() {
            "name" | "nome" => Ok(SearchKind::Name),
            "code" | "codigo" => Ok(SearchKind::Code),
            "rg" => Ok(SearchKind::Rg),
            "cpf" => Ok(SearchKind::Cpf),
            "registration" | "matricula" => Ok(SearchKind::Registration),
            "pis" => Ok(SearchKind::Pis),
            "hr-registration" | "registro-rh" => Ok(SearchKind::HrRegistration),
            "social-name" | "nome-social" => Ok(SearchKind::SocialName),
            other => Err(Error::InvalidRequest(format!(
                "unknown search kind '{}'",
                other
            ))),
        }
    }
}

/// Employee status filter on the search screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    Active,
    Inactive,
    Pending,
    OnLeave,
    Vacation,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 5] = [
        StatusFilter::Active,
        StatusFilter::Inactive,
        StatusFilter::Pending,
        StatusFilter::OnLeave,
        StatusFilter::Vacation,
    ];

    /// `name` attribute of the filter checkbox
    pub fn field_name(&self) -> &'static str {
        match self {
            StatusFilter::Active => "ativo",
            StatusFilter::Inactive => "inativo",
            StatusFilter::Pending => "pendente",
            StatusFilter::OnLeave => "afastado",
            StatusFilter::Vacation => "ferias",
        }
    }
}

/// Desired state of every status filter checkbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusFilters {
    pub active: bool,
    pub inactive: bool,
    pub pending: bool,
    pub on_leave: bool,
    pub vacation: bool,
}

impl Default for StatusFilters {
    fn default() -> Self {
        Self {
            active: true,
            inactive: true,
            pending: true,
            on_leave: true,
            vacation: true,
        }
    }
}

impl StatusFilters {
    /// Filters with only the given statuses enabled
    pub fn only(statuses: &[StatusFilter]) -> Self {
        let mut filters = Self {
            active: false,
            inactive: false,
            pending: false,
            on_leave: false,
            vacation: false,
        };
        for status in statuses {
            filters.set(*status, true);
        }
        filters
    }

    pub fn get(&self, status: StatusFilter) -> bool {
        match status {
            StatusFilter::Active => self.active,
            StatusFilter::Inactive => self.inactive,
            StatusFilter::Pending => self.pending,
            StatusFilter::OnLeave => self.on_leave,
            StatusFilter::Vacation => self.vacation,
        }
    }

    pub fn set(&mut self, status: StatusFilter, value: bool) {
        match status {
            StatusFilter::Active => self.active = value,
            StatusFilter::Inactive => self.inactive = value,
            StatusFilter::Pending => self.pending = value,
            StatusFilter::OnLeave => self.on_leave = value,
            StatusFilter::Vacation => self.vacation = value,
        }
    }

    /// Checkbox name paired with its desired state, in screen order
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        StatusFilter::ALL
            .iter()
            .map(move |status| (status.field_name(), self.get(*status)))
    }
}

/// Which parts of the record are copied to the destination company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyFlags {
    pub clinical_record: bool,
    pub medical_registration: bool,
    pub vaccine_history: bool,
    pub labor_history: bool,
    pub soc_ged: bool,
}

impl Default for CopyFlags {
    fn default() -> Self {
        Self {
            clinical_record: true,
            medical_registration: true,
            vaccine_history: true,
            labor_history: true,
            soc_ged: true,
        }
    }
}

/// One employee transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub search_term: String,
    pub search_kind: SearchKind,
    #[serde(default)]
    pub status_filters: StatusFilters,
    #[serde(default)]
    pub source_company: Option<String>,
    #[serde(default)]
    pub destination_company: Option<String>,
    #[serde(default)]
    pub copy_flags: CopyFlags,
    #[serde(default = "default_migrate_record_only")]
    pub migrate_record_only: bool,
}

fn default_migrate_record_only() -> bool {
    true
}

impl TransferRequest {
    /// Request with default filters and copy flags
    pub fn new(
        search_term: impl Into<String>,
        search_kind: SearchKind,
        destination_company: impl Into<String>,
    ) -> Self {
        Self {
            search_term: search_term.into(),
            search_kind,
            status_filters: StatusFilters::default(),
            source_company: None,
            destination_company: Some(destination_company.into()),
            copy_flags: CopyFlags::default(),
            migrate_record_only: true,
        }
    }

    pub fn with_source_company(mut self, company: impl Into<String>) -> Self {
        self.source_company = Some(company.into());
        self
    }

    pub fn with_status_filters(mut self, filters: StatusFilters) -> Self {
        self.status_filters = filters;
        self
    }

    pub fn with_copy_flags(mut self, flags: CopyFlags) -> Self {
        self.copy_flags = flags;
        self
    }

    pub fn with_migrate_record_only(mut self, value: bool) -> Self {
        self.migrate_record_only = value;
        self
    }

    /// Destination company code, if present and non-blank
    pub fn destination(&self) -> Option<&str> {
        self.destination_company
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    /// Source company code, if present and non-blank
    pub fn source(&self) -> Option<&str> {
        self.source_company
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    /// Copy checkbox ids paired with their desired state
    pub fn copy_options(&self) -> [(&'static str, bool); 6] {
        [
            ("copiaFichaClinica", self.copy_flags.clinical_record),
            ("copiaCadastroMedico", self.copy_flags.medical_registration),
            ("copiaHistoricoVacinas", self.copy_flags.vaccine_history),
            ("copiaHistoricoLaboral", self.copy_flags.labor_history),
            ("copiaSocGed", self.copy_flags.soc_ged),
            ("migrarSomenteFicha", self.migrate_record_only),
        ]
    }
}
