//! Element ids, selectors and page hooks of the SOC web application.
//!
//! None of this is documented by the vendor; it is what the live pages expose.

/// Alert overlay raised by the application's own scripts
pub const MODAL: &str = "modalalertas";
pub const MODAL_CONTENT: &str = "#modalalertas #modalalertasConteudo";
pub const MODAL_OK: &str = "#modalalertas #btn_ok";

pub const SCREEN_PROGRAM: &str = "infoPrograma";
pub const SCREEN_COMPANY: &str = "infoEmpresa";

/// Menu rows whose `onclick` dispatches to a screen
pub const MENU_ROWS: &str = "//tr[contains(@onclick, 'MainJava')]";

pub const HOME_SCRIPT: &str = "Empresas(); hideall(); hidemenus(''); menu_close(); avisoLogin();";

pub const LOGIN_USERNAME: &str = "usu";
pub const LOGIN_PASSWORD: &str = "senha";
pub const LOGIN_COMPANY: &str = "empsoc";
pub const LOGIN_SUBMIT_SCRIPT: &str = "document.getElementById('bt_entrar').click();";
/// Only rendered once logged in
pub const LOGGED_IN_BAR: &str = "barra";
pub const LOGGED_IN_ICONS: &str = "barraIcones";

pub const SEARCH_KIND_RADIO: &str = "codigoPesquisaFuncionario";
pub const SEARCH_FIELD: &str = "nomeSeach";
pub const RESULT_ROWS: &str = "table.resultados tr:not(:first-child)";
pub const RESULT_LINKS: &str = "table.resultados tr:not(:first-child) td.codigo a";
pub const RESULT_NAMES: &str = "table.resultados tr:not(:first-child) td:nth-child(2)";
pub const TRANSFER_LINK: &str = "a[onclick*='transfunc']";

pub const COPY_CLINICAL_RECORD: &str = "copiaFichaClinica";
pub const TRANSFER_COMPANY_FIELD: &str = "empVo.cod";
pub const TRANSFER_TITLE: &str = "Transferência de Funcionário";

pub const DESTINATION_COMPANY: &str = "codigoDaEmpresa";
pub const DESTINATION_UPDATE_SCRIPT: &str =
    "trazUnseca(document.getElementById('codigoDaEmpresa').value);";
pub const ASSOCIATE_ALL_SCRIPT: &str = "fassociarTodos();";
pub const ZOOM_SCRIPT: &str = "zoom();";
pub const POPUP_RESULT_LINKS: &str = "a[href*='javascript:sendValue']";

/// Modals the transfer screen may raise after saving, checked in this order
pub const TRANSFER_ERROR_MODAL: &str = "alertaErroTransferencia";
pub const TRANSFER_MODALS: [&str; 3] = [TRANSFER_ERROR_MODAL, MODAL, "modalTransfFuncionario"];
pub const TRANSFER_MODAL_MESSAGE: &str = "#conteudosTable";
pub const TRANSFER_MODAL_MESSAGE_ALT: &str = ".modalConteudo";
pub const TRANSFER_MODAL_OK: &str = ".botaoT";
pub const CLOSE_TRANSFER_ERROR_SCRIPT: &str = "fecharErroTransferencia();";

/// Screen labels that mean the save returned to a known place
pub const EMPLOYEE_SCREEN_LABEL: &str = "Funcionário";
pub const HOME_SCREEN_LABEL: &str = "Página Inicial";

/// `doAcao` dispatches every toolbar action on the employee screens
pub fn action(name: &str) -> String {
    format!("doAcao('{}');", name)
}

/// Quote `value` as a JavaScript string literal
pub fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
