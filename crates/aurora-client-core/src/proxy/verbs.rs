//! Typed wrappers for RPCs whose trailing argument is optional.

use serde_json::Value;

use super::{ProxyError, SchedulerProxy};
use crate::rpc::{arg, Method, Response};

impl SchedulerProxy {
    /// Heartbeat a coordinated update. The token is only sent when given.
    pub fn pulse_job_update(
        &mut self,
        key: Value,
        token: Option<Value>,
    ) -> Result<Response, ProxyError> {
        let mut args = vec![key];
        args.extend(token);
        self.invoke(Method::PulseJobUpdate, args)
    }

    pub fn pause_job_update(
        &mut self,
        key: Value,
        message: Option<&str>,
    ) -> Result<Response, ProxyError> {
        self.invoke(Method::PauseJobUpdate, vec![key, arg::optional_string(message)])
    }

    pub fn resume_job_update(
        &mut self,
        key: Value,
        message: Option<&str>,
    ) -> Result<Response, ProxyError> {
        self.invoke(Method::ResumeJobUpdate, vec![key, arg::optional_string(message)])
    }

    pub fn abort_job_update(
        &mut self,
        key: Value,
        message: Option<&str>,
    ) -> Result<Response, ProxyError> {
        self.invoke(Method::AbortJobUpdate, vec![key, arg::optional_string(message)])
    }

    pub fn rollback_job_update(
        &mut self,
        key: Value,
        message: Option<&str>,
    ) -> Result<Response, ProxyError> {
        self.invoke(Method::RollbackJobUpdate, vec![key, arg::optional_string(message)])
    }

    pub fn start_job_update(
        &mut self,
        request: Value,
        message: Option<&str>,
    ) -> Result<Response, ProxyError> {
        self.invoke(Method::StartJobUpdate, vec![request, arg::optional_string(message)])
    }

    pub fn get_job_update_details(
        &mut self,
        key: Value,
        query: Option<Value>,
    ) -> Result<Response, ProxyError> {
        self.invoke(
            Method::GetJobUpdateDetails,
            vec![key, query.unwrap_or(Value::Null)],
        )
    }

    pub fn kill_tasks(
        &mut self,
        job: Value,
        instances: Value,
        message: Option<&str>,
    ) -> Result<Response, ProxyError> {
        self.invoke(
            Method::KillTasks,
            vec![job, instances, arg::optional_string(message)],
        )
    }
}
