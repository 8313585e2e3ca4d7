mod cpp;
mod java;
mod process;
mod python;
pub mod traits;

use std::sync::Arc;

use crate::domain::Language;
use crate::error::RunError;
use crate::judge::cpp::CppJudge;
use crate::judge::java::JavaJudge;
use crate::judge::python::PythonJudge;
use crate::judge::traits::Judge;

/// Registry lookup: one backend per supported language, selected once at
/// startup. An unknown name never gets this far (`Language::parse` gates it).
pub fn judge_for(language: Language) -> Result<Arc<dyn Judge>, RunError> {
    let judge: Arc<dyn Judge> = match language {
        Language::GnuCpp => Arc::new(CppJudge::new().map_err(RunError::Workspace)?),
        Language::Python => Arc::new(PythonJudge::new().map_err(RunError::Workspace)?),
        Language::Java => Arc::new(JavaJudge::new().map_err(RunError::Workspace)?),
    };
    Ok(judge)
}
