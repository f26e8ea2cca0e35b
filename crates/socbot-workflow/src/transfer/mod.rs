//! Employee transfer between companies.
//!
//! The workflow runs five phases in order. Each one must succeed for the next to start; the
//! first failure stops the run and puts the session back on the primary window. Nothing is
//! rolled back.

mod controls;
mod destination;
mod finalize;
mod locate;
mod options;
mod prepare;

pub use controls::CheckboxChange;

use crate::session::Session;
use crate::Result;
use async_trait::async_trait;
use socbot_core::TransferRequest;
use std::fmt;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prepare,
    Locate,
    Configure,
    Destination,
    Finalize,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Prepare,
        Phase::Locate,
        Phase::Configure,
        Phase::Destination,
        Phase::Finalize,
    ];

    pub fn number(&self) -> usize {
        Self::ALL.iter().position(|p| p == self).unwrap_or(0) + 1
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Prepare => "prepare environment",
            Phase::Locate => "locate source record",
            Phase::Configure => "configure transfer options",
            Phase::Destination => "select destination",
            Phase::Finalize => "finalize",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Success,
    Failure,
}

impl From<bool> for PhaseOutcome {
    fn from(ok: bool) -> Self {
        if ok {
            PhaseOutcome::Success
        } else {
            PhaseOutcome::Failure
        }
    }
}

#[async_trait]
pub(crate) trait PhaseRunner: Send {
    async fn run_phase(&mut self, phase: Phase) -> Result<PhaseOutcome>;

    /// Best-effort return to a known window and frame
    async fn recover(&mut self);
}

/// Run every phase in order; `true` only if all of them succeed.
///
/// An error in the final phase still counts as success: by then the save was issued and
/// may well have gone through.
pub(crate) async fn run_phases<R: PhaseRunner>(runner: &mut R) -> bool {
    for phase in Phase::ALL {
        info!("Phase {}/{}: {}", phase.number(), Phase::ALL.len(), phase);

        let outcome = match runner.run_phase(phase).await {
            Ok(outcome) => outcome,
            Err(e) if phase == Phase::Finalize => {
                warn!(
                    "Error while finalizing ({}); the save was issued, reporting success",
                    e
                );
                runner.recover().await;
                PhaseOutcome::Success
            }
            Err(e) => {
                error!("Phase '{}' failed: {}", phase, e);
                PhaseOutcome::Failure
            }
        };

        if outcome == PhaseOutcome::Failure {
            error!("Stopping transfer at phase '{}'", phase);
            runner.recover().await;
            return false;
        }
        debug!("Phase '{}' done", phase);
    }
    true
}

struct TransferWorkflow<'a> {
    session: &'a mut Session,
    request: &'a TransferRequest,
}

#[async_trait]
impl PhaseRunner for TransferWorkflow<'_> {
    async fn run_phase(&mut self, phase: Phase) -> Result<PhaseOutcome> {
        match phase {
            Phase::Prepare => prepare::run(self.session, self.request).await,
            Phase::Locate => locate::run(self.session, self.request).await,
            Phase::Configure => options::run(self.session, self.request).await,
            Phase::Destination => destination::run(self.session, self.request).await,
            Phase::Finalize => finalize::run(self.session).await,
        }
    }

    async fn recover(&mut self) {
        self.session.ensure_context().await;
    }
}

/// Transfer one employee to the request's destination company.
///
/// Must run on a logged-in session. Every failure ends as `false` with the reason logged.
pub async fn transfer(session: &mut Session, request: &TransferRequest) -> bool {
    info!("Starting transfer of employee '{}'", request.search_term);
    let primary = session.ensure_primary();
    debug!("Working in primary window {}", primary);

    let mut workflow = TransferWorkflow { session, request };
    let done = run_phases(&mut workflow).await;

    if done {
        info!("Transfer of '{}' finished", request.search_term);
    } else {
        error!("Transfer of '{}' failed", request.search_term);
    }
    done
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom;
    use crate::testing::{CONTENT, FakeDriver, FakeElement, FakeState, MAIN, session_on};
    use crate::Error;
    use socbot_browser::{Locator, WindowHandle};
    use socbot_core::{CopyFlags, SearchKind};
    use std::sync::Arc;

    const POPUP: &str = "popup";

    struct ScriptedRunner {
        outcomes: Vec<Result<PhaseOutcome>>,
        ran: Vec<Phase>,
        recoveries: usize,
    }

    impl ScriptedRunner {
        fn new(outcomes: Vec<Result<PhaseOutcome>>) -> Self {
            Self {
                outcomes,
                ran: Vec::new(),
                recoveries: 0,
            }
        }
    }

    #[async_trait]
    impl PhaseRunner for ScriptedRunner {
        async fn run_phase(&mut self, phase: Phase) -> Result<PhaseOutcome> {
            self.ran.push(phase);
            self.outcomes.remove(0)
        }

        async fn recover(&mut self) {
            self.recoveries += 1;
        }
    }

    fn outcome(code: u8) -> Result<PhaseOutcome> {
        match code {
            0 => Ok(PhaseOutcome::Success),
            1 => Ok(PhaseOutcome::Failure),
            _ => Err(Error::ElementNotFound("scripted".to_string())),
        }
    }

    #[tokio::test]
    async fn test_result_is_conjunction_of_first_four_phases() {
        // Every combination of success / failure / error across the five phases
        for combo in 0..3u32.pow(5) {
            let codes: Vec<u8> = (0..5).map(|i| ((combo / 3u32.pow(i)) % 3) as u8).collect();
            let mut runner = ScriptedRunner::new(codes.iter().map(|c| outcome(*c)).collect());

            let done = run_phases(&mut runner).await;

            let first_bad = codes[..4].iter().position(|c| *c != 0);
            match first_bad {
                Some(index) => {
                    assert!(!done, "codes {:?}", codes);
                    assert_eq!(runner.ran, Phase::ALL[..=index].to_vec(), "codes {:?}", codes);
                    assert_eq!(runner.recoveries, 1);
                }
                None => {
                    let expected = codes[4] != 1;
                    assert_eq!(done, expected, "codes {:?}", codes);
                    assert_eq!(runner.ran, Phase::ALL.to_vec());
                    assert_eq!(runner.recoveries, usize::from(codes[4] != 0));
                }
            }
        }
    }

    #[test]
    fn test_phase_numbering() {
        assert_eq!(Phase::Prepare.number(), 1);
        assert_eq!(Phase::Finalize.number(), 5);
        assert_eq!(Phase::Destination.to_string(), "select destination");
        assert_eq!(PhaseOutcome::from(false), PhaseOutcome::Failure);
    }

    fn set_program(state: &mut FakeState, program: &str) {
        if let Some(el) = state.element_mut(MAIN, &[], &Locator::id(dom::SCREEN_PROGRAM)) {
            el.text = program.to_string();
        }
    }

    fn add_once(state: &mut FakeState, frames: &[&str], element: FakeElement) {
        let exists = element
            .id
            .as_deref()
            .is_some_and(|id| state.element(MAIN, frames, &Locator::id(id)).is_some());
        if !exists {
            state.add(MAIN, frames, element);
        }
    }

    /// The SOC pages involved in a transfer, as far as the workflow can observe them
    fn soc_site(with_results: bool) -> Arc<FakeDriver> {
        let fake = FakeDriver::new();
        {
            let mut s = fake.state();
            s.add_frame(MAIN, &[CONTENT]);
            s.add(
                MAIN,
                &[],
                FakeElement::with_id(dom::SCREEN_PROGRAM).text("Página Inicial"),
            );
            s.add(
                MAIN,
                &[],
                FakeElement::matching(dom::MENU_ROWS)
                    .attr("onclick", "MainJava('232', 'Transferência de Funcionário');"),
            );
            s.add(
                MAIN,
                &[CONTENT],
                FakeElement::matching("input[name='codigoPesquisaFuncionario'][value='3']")
                    .checked(false),
            );
            for (name, checked) in [
                ("ativo", true),
                ("inativo", true),
                ("pendente", true),
                ("afastado", true),
                ("ferias", false),
            ] {
                s.add(MAIN, &[CONTENT], FakeElement::with_name(name).checked(checked));
            }
            s.add(MAIN, &[CONTENT], FakeElement::with_name(dom::SEARCH_FIELD));
        }

        fake.on("MainJava('232'", |s, _| {
            set_program(s, "232 - Transferência de Funcionário")
        });
        fake.on(dom::HOME_SCRIPT, |s, _| set_program(s, "Página Inicial"));

        if with_results {
            fake.on("doAcao('browse')", |s, ctx| {
                if ctx.window.as_str() != MAIN {
                    return;
                }
                s.add(MAIN, &[CONTENT], FakeElement::matching(dom::RESULT_ROWS));
                s.add(
                    MAIN,
                    &[CONTENT],
                    FakeElement::matching(dom::RESULT_LINKS)
                        .attr("href", "javascript:selbrowse('12345')")
                        .text(" 12345 "),
                );
                s.add(
                    MAIN,
                    &[CONTENT],
                    FakeElement::matching(dom::RESULT_NAMES).text("JOAO DA SILVA"),
                );
            });
        }

        fake.on("selbrowse(", |s, _| {
            s.add(
                MAIN,
                &[CONTENT],
                FakeElement::matching(dom::TRANSFER_LINK).on_click("doAcao('transfunc')"),
            );
        });
        fake.on("doAcao('transfunc')", |s, _| {
            s.add(
                MAIN,
                &[CONTENT],
                FakeElement::with_name(dom::TRANSFER_COMPANY_FIELD),
            );
        });
        fake.on("doAcao('alt')", |s, _| {
            for id in [
                "copiaFichaClinica",
                "copiaCadastroMedico",
                "copiaHistoricoVacinas",
                "copiaHistoricoLaboral",
                "copiaSocGed",
            ] {
                add_once(s, &[CONTENT], FakeElement::with_id(id).checked(false));
            }
            add_once(
                s,
                &[CONTENT],
                FakeElement::with_id("migrarSomenteFicha").checked(true),
            );
            add_once(s, &[CONTENT], FakeElement::with_id(dom::DESTINATION_COMPANY));
        });
        fake.on("doAcao('save')", |s, _| {
            s.dialogs
                .insert(MAIN.to_string(), "Confirma a transferência?".to_string());
        });

        Arc::new(fake)
    }

    /// Make `zoom()` open the destination employee popup
    fn with_popup(fake: &FakeDriver, with_results: bool) {
        fake.on("zoom()", |s, _| {
            s.open_window(POPUP);
            s.add(POPUP, &[], FakeElement::with_name(dom::SEARCH_FIELD));
            s.add(POPUP, &[], FakeElement::with_id("rbCPF").checked(false));
        });
        if with_results {
            fake.on("doAcao('browse')", |s, ctx| {
                if ctx.window.as_str() == POPUP {
                    s.add(
                        POPUP,
                        &[],
                        FakeElement::matching(dom::POPUP_RESULT_LINKS)
                            .attr("href", "javascript:sendValue('77','JOAO DA SILVA');"),
                    );
                }
            });
        }
        fake.on("sendValue(", |s, _| s.close(POPUP));
    }

    fn cpf_request() -> TransferRequest {
        TransferRequest::new("12345678900", SearchKind::Cpf, "0042")
    }

    #[tokio::test]
    async fn test_full_transfer_without_popup() {
        let fake = soc_site(true);
        let mut session = session_on(&fake).await;
        session.designate_primary();

        assert!(transfer(&mut session, &cpf_request()).await);

        let state = fake.state();
        // Search
        assert!(state.values.contains(&(
            "[name=nomeSeach]".to_string(),
            "12345678900".to_string()
        )));
        let cpf_radio = state
            .element(
                MAIN,
                &[CONTENT],
                &Locator::css("input[name='codigoPesquisaFuncionario'][value='3']"),
            )
            .and_then(|el| el.checked);
        assert_eq!(cpf_radio, Some(true));
        assert!(state.clicked("[name=ferias]"));
        assert!(!state.clicked("[name=ativo]"));
        assert!(state.ran("selbrowse(\"12345\");"));
        assert!(state.clicked(dom::TRANSFER_LINK));

        // Options: five unchecked copy boxes clicked, the already checked one left alone
        for id in [
            "copiaFichaClinica",
            "copiaCadastroMedico",
            "copiaHistoricoVacinas",
            "copiaHistoricoLaboral",
            "copiaSocGed",
        ] {
            assert!(state.clicked(&format!("#{}", id)), "{} not clicked", id);
        }
        assert!(!state.clicked("#migrarSomenteFicha"));
        assert_eq!(state.script_count("doAcao('alt')"), 1);
        assert!(state.ran(dom::ASSOCIATE_ALL_SCRIPT));

        // Destination
        assert!(state.values.contains(&(
            "#codigoDaEmpresa".to_string(),
            "0042".to_string()
        )));
        let company = state
            .element(MAIN, &[CONTENT], &Locator::id(dom::DESTINATION_COMPANY))
            .map(|el| el.value.as_str());
        assert_eq!(company, Some("0042"));
        assert!(state.ran(dom::DESTINATION_UPDATE_SCRIPT));
        assert!(state.ran(dom::ZOOM_SCRIPT));

        // Finalize
        assert!(state.ran("doAcao('save')"));
        assert_eq!(state.accepted_dialogs, vec!["Confirma a transferência?"]);
        assert_eq!(state.window_count(), 1);
        drop(state);
        assert_eq!(session.primary_window(), Some(&WindowHandle::new(MAIN)));
    }

    #[tokio::test]
    async fn test_no_search_results_stops_before_configuration() {
        let fake = soc_site(false);
        let mut session = session_on(&fake).await;

        assert!(!transfer(&mut session, &cpf_request()).await);

        let state = fake.state();
        assert!(state.ran("doAcao('browse')"));
        assert!(!state.ran("selbrowse("));
        assert!(!state.ran("doAcao('alt')"));
        assert!(!state.ran(dom::ZOOM_SCRIPT));
        assert!(!state.ran("doAcao('save')"));
        drop(state);
        // Recovery left the session on the content frame
        assert_eq!(session.frame_path(), [CONTENT.to_string()]);
    }

    #[tokio::test]
    async fn test_missing_destination_fails_without_touching_company_field() {
        let fake = soc_site(true);
        let mut session = session_on(&fake).await;
        let mut request = cpf_request();
        request.destination_company = Some("   ".to_string());

        assert!(!transfer(&mut session, &request).await);

        let state = fake.state();
        assert!(state.ran("doAcao('alt')"));
        assert!(!state.values.iter().any(|(field, _)| field == "#codigoDaEmpresa"));
        assert!(!state.ran(dom::DESTINATION_UPDATE_SCRIPT));
        assert!(!state.ran(dom::ZOOM_SCRIPT));
        assert!(!state.ran("doAcao('save')"));
    }

    #[tokio::test]
    async fn test_unknown_transfer_screen_aborts_in_preparation() {
        let fake = soc_site(true);
        fake.state()
            .remove(MAIN, &[], &Locator::xpath(dom::MENU_ROWS));
        let mut session = session_on(&fake).await;

        assert!(!transfer(&mut session, &cpf_request()).await);
        assert!(!fake.state().ran("doAcao('browse')"));
    }

    #[tokio::test]
    async fn test_destination_employee_selected_in_popup() {
        let fake = soc_site(true);
        with_popup(&fake, true);
        let mut session = session_on(&fake).await;

        assert!(transfer(&mut session, &cpf_request()).await);

        let state = fake.state();
        assert!(state.values.contains(&(
            "[name=nomeSeach]".to_string(),
            "12345678900".to_string()
        )));
        assert!(state.clicked(&format!("{}:<root>|#rbCPF", POPUP)));
        assert!(state.ran("sendValue('77','JOAO DA SILVA');"));
        assert!(!state.has_window(POPUP));
        assert!(state.ran("doAcao('save')"));
        drop(state);
        assert_eq!(session.window().as_str(), MAIN);
    }

    #[tokio::test]
    async fn test_popup_without_match_is_closed_and_transfer_continues() {
        let fake = soc_site(true);
        with_popup(&fake, false);
        let mut session = session_on(&fake).await;

        assert!(transfer(&mut session, &cpf_request()).await);

        let state = fake.state();
        assert_eq!(state.closed, vec![POPUP]);
        assert!(!state.ran("sendValue("));
        assert!(state.ran("doAcao('save')"));
    }

    #[tokio::test]
    async fn test_edit_mode_never_confirmed_takes_screenshots_and_continues() {
        let fake = soc_site(true);
        // The transfer screen never offers the copy options
        fake.on("doAcao('alt')", |s, _| {
            s.remove(MAIN, &[CONTENT], &Locator::id("copiaFichaClinica"));
        });
        let mut session = session_on(&fake).await;

        assert!(transfer(&mut session, &cpf_request()).await);

        let state = fake.state();
        assert_eq!(state.script_count("doAcao('alt')"), 3);
        assert_eq!(state.screenshots.len(), 3);
        let last = state.screenshots[2].file_name().unwrap().to_string_lossy().to_string();
        assert!(last.starts_with("transfer_edit_") && last.ends_with("_3.png"));
    }

    #[tokio::test]
    async fn test_unconfirmed_transfer_screen_still_configures() {
        let fake = soc_site(true);
        // The transfer screen loads without any of its landmarks
        fake.on("doAcao('transfunc')", |s, _| {
            s.remove(MAIN, &[CONTENT], &Locator::name(dom::TRANSFER_COMPANY_FIELD));
        });
        let mut session = session_on(&fake).await;

        assert!(transfer(&mut session, &cpf_request()).await);

        let state = fake.state();
        assert!(state.clicked(dom::TRANSFER_LINK));
        assert!(state.ran("doAcao('alt')"));
        assert!(state.ran("doAcao('save')"));
    }

    #[tokio::test]
    async fn test_save_without_any_confirmation_counts_as_done() {
        let fake = soc_site(true);
        fake.on("doAcao('save')", |s, _| {
            s.dialogs.remove(MAIN);
        });
        fake.on(dom::HOME_SCRIPT, |s, _| set_program(s, "100 - Empresas"));
        let mut session = session_on(&fake).await;

        assert!(transfer(&mut session, &cpf_request()).await);

        let state = fake.state();
        assert!(state.ran("doAcao('save')"));
        assert!(state.ran(dom::HOME_SCRIPT));
        assert!(state.accepted_dialogs.is_empty());
    }

    #[tokio::test]
    async fn test_popup_error_closes_popup_and_transfer_continues() {
        let fake = soc_site(true);
        with_popup(&fake, true);
        fake.state()
            .failing_scripts
            .push((POPUP.to_string(), "doAcao('browse')".to_string()));
        let mut session = session_on(&fake).await;

        assert!(transfer(&mut session, &cpf_request()).await);

        let state = fake.state();
        assert_eq!(state.closed, vec![POPUP]);
        assert!(!state.ran("sendValue("));
        assert!(state.ran("doAcao('save')"));
        drop(state);
        assert_eq!(session.window().as_str(), MAIN);
        assert_eq!(session.frame_path(), [CONTENT.to_string()]);
    }

    #[tokio::test]
    async fn test_error_while_saving_still_reports_success() {
        let fake = soc_site(true);
        fake.state()
            .failing_scripts
            .push((MAIN.to_string(), "doAcao('save')".to_string()));
        let mut session = session_on(&fake).await;

        assert!(transfer(&mut session, &cpf_request()).await);

        let state = fake.state();
        assert!(state.ran("doAcao('save')"));
        assert!(state.accepted_dialogs.is_empty());
        assert!(!state.ran(dom::HOME_SCRIPT));
        drop(state);
        // Recovery put the session back on the content frame
        assert_eq!(session.frame_path(), [CONTENT.to_string()]);
    }

    #[tokio::test]
    async fn test_copy_flags_are_respected() {
        let fake = soc_site(true);
        let mut session = session_on(&fake).await;
        let request = cpf_request()
            .with_copy_flags(CopyFlags {
                soc_ged: false,
                ..CopyFlags::default()
            })
            .with_migrate_record_only(false);

        assert!(transfer(&mut session, &request).await);

        let state = fake.state();
        assert!(!state.clicked("#copiaSocGed"));
        assert!(state.clicked("#migrarSomenteFicha"));
    }

    #[tokio::test]
    async fn test_source_company_switch() {
        let fake = soc_site(true);
        let mut session = session_on(&fake).await;

        let request = cpf_request().with_source_company("0001");
        assert!(transfer(&mut session, &request).await);
        assert_eq!(fake.state().script_count("choiceemp("), 1);

        // Already in the source company, no second switch
        assert!(transfer(&mut session, &request).await);
        assert_eq!(fake.state().script_count("choiceemp("), 1);
    }

    #[tokio::test]
    async fn test_transfer_error_modal_is_dismissed_by_script() {
        let fake = soc_site(true);
        fake.on("doAcao('save')", |s, _| {
            s.add(
                MAIN,
                &[CONTENT],
                FakeElement::with_id(dom::TRANSFER_ERROR_MODAL),
            );
            s.add(
                MAIN,
                &[CONTENT],
                FakeElement::matching("#alertaErroTransferencia .modalConteudo")
                    .text("Funcionário já existe na empresa destino"),
            );
        });
        let mut session = session_on(&fake).await;

        assert!(transfer(&mut session, &cpf_request()).await);
        assert!(fake.state().ran(dom::CLOSE_TRANSFER_ERROR_SCRIPT));
    }
}
