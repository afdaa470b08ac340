use serde::{Deserialize, Serialize};
use serde_json::Value;

// POST /puzzle/solve body
// fields stay loose so bad values reach the aggregator's clipping
#[derive(Deserialize, Debug, Default)]
pub struct SolveRequest {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub time: Option<Value>,
    #[serde(default, rename = "userId")]
    pub user_id: Option<Value>,
}

// POST /puzzle/star body
#[derive(Deserialize, Debug, Default)]
pub struct StarRequest {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default, rename = "userId")]
    pub user_id: Option<Value>,
}

// non-string codes count as missing
fn code_str(code: Option<&Value>) -> Option<&str> {
    code.and_then(Value::as_str)
}

impl SolveRequest {
    pub fn code(&self) -> Option<&str> {
        code_str(self.code.as_ref())
    }
}

impl StarRequest {
    pub fn code(&self) -> Option<&str> {
        code_str(self.code.as_ref())
    }
}

#[derive(Serialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
