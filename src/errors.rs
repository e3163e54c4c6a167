use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FilterError {
    #[error("failed to read {role} rule file `{path}`")]
    #[diagnostic(
        code(palisade::rule_load),
        help("Check that the file exists and is readable by the service account")
    )]
    RuleFileLoad {
        role: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}
