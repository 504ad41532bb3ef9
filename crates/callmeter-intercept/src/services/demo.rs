use std::sync::Arc;
use std::time::Duration;

use callmeter_core::error::{CallMeterError, Result};

use crate::intercept::{Interceptor, MethodId};

pub const TARGET: &str = "DemoService";

pub const GET_VALUE: MethodId = MethodId::new(TARGET, "GetValue");
pub const SET_VALUE: MethodId = MethodId::new(TARGET, "SetValue");
pub const CHARGE: MethodId = MethodId::new(TARGET, "Charge");

/// Small intercepted service used by the demo binary.
pub struct DemoService {
    interceptor: Arc<Interceptor>,
}

impl DemoService {
    pub fn new(interceptor: Arc<Interceptor>) -> Self {
        Self { interceptor }
    }

    /// Resolve a route segment to a known method.
    pub fn method(name: &str) -> Option<MethodId> {
        [GET_VALUE, SET_VALUE, CHARGE]
            .into_iter()
            .find(|m| m.method.eq_ignore_ascii_case(name))
    }

    /// Run `method`, sleeping a little to produce a visible latency.
    pub async fn call(&self, method: MethodId, fail: bool) -> Result<String> {
        self.interceptor
            .intercept_async(method, async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                if fail {
                    return Err(CallMeterError::Internal(format!("{method} failed on request")));
                }
                Ok(format!("{method} ok"))
            })
            .await
    }
}
