//! Scheduler RPC surface: the method table, argument adapters, and the stub
//! that turns a call into bytes on a [`Transport`](crate::transport::Transport).
//!
//! Argument values are opaque, already-encoded Thrift JSON values (see [`arg`]);
//! this crate never interprets the scheduler's request structs.

mod envelope;
mod error;
mod response;
mod stub;

pub use envelope::{decode_call, decode_reply, encode_call, encode_exception, encode_reply, MessageType};
pub use error::RpcError;
pub use response::{Response, ResponseCode, ResponseDetail};
pub use stub::{SchedulerStub, StubFactory, ThriftClient, ThriftJsonStub, ThriftJsonStubFactory};

use serde_json::Value;
use thiserror::Error;

/// Positional-argument shape of one RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: &'static str,
    /// Arguments the caller must supply.
    pub required: usize,
    /// Trailing arguments the caller may omit.
    pub optional: usize,
    /// Omitted optionals are forwarded as `None` rather than dropped.
    pub pad_optional: bool,
}

impl MethodSpec {
    const fn fixed(name: &'static str, required: usize) -> Self {
        Self {
            name,
            required,
            optional: 0,
            pad_optional: false,
        }
    }

    /// One trailing optional argument, always forwarded (`None` when omitted).
    const fn padded(name: &'static str, required: usize) -> Self {
        Self {
            name,
            required,
            optional: 1,
            pad_optional: true,
        }
    }

    /// One trailing optional argument, forwarded only when given.
    const fn trailing(name: &'static str, required: usize) -> Self {
        Self {
            name,
            required,
            optional: 1,
            pad_optional: false,
        }
    }

    /// Check arity and apply the padding rule.
    pub fn adapt(&self, mut args: Vec<Value>) -> Result<Vec<Value>, ArgumentError> {
        let max = self.required + self.optional;
        if args.len() < self.required || args.len() > max {
            return Err(ArgumentError {
                method: self.name,
                min: self.required,
                max,
                got: args.len(),
            });
        }
        if self.pad_optional {
            args.resize(max, Value::Null);
        }
        Ok(args)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{method} takes {min}..={max} arguments, got {got}")]
pub struct ArgumentError {
    pub method: &'static str,
    pub min: usize,
    pub max: usize,
    pub got: usize,
}

/// Every RPC the scheduler API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    // Read-only
    GetRoleSummary,
    GetJobSummary,
    GetTasksStatus,
    GetTasksWithoutConfigs,
    GetPendingReason,
    GetConfigSummary,
    GetJobs,
    GetQuota,
    PopulateJobConfig,
    GetJobUpdateSummaries,
    GetJobUpdateDetails,
    GetJobUpdateDiff,
    GetTierConfigs,
    // Job management
    CreateJob,
    ScheduleCronJob,
    DescheduleCronJob,
    StartCronJob,
    RestartShards,
    KillTasks,
    AddInstances,
    ReplaceCronTemplate,
    StartJobUpdate,
    PauseJobUpdate,
    ResumeJobUpdate,
    AbortJobUpdate,
    RollbackJobUpdate,
    PulseJobUpdate,
    // Admin
    SetQuota,
    ForceTaskState,
    PerformBackup,
    ListBackups,
    StageRecovery,
    QueryRecovery,
    DeleteRecoveryTasks,
    CommitRecovery,
    UnloadRecovery,
    Snapshot,
    TriggerExplicitTaskReconciliation,
    TriggerImplicitTaskReconciliation,
    PruneTasks,
    StartMaintenance,
    DrainHosts,
    MaintenanceStatus,
    EndMaintenance,
    SlaDrainHosts,
}

impl Method {
    pub const ALL: [Method; 45] = [
        Method::GetRoleSummary,
        Method::GetJobSummary,
        Method::GetTasksStatus,
        Method::GetTasksWithoutConfigs,
        Method::GetPendingReason,
        Method::GetConfigSummary,
        Method::GetJobs,
        Method::GetQuota,
        Method::PopulateJobConfig,
        Method::GetJobUpdateSummaries,
        Method::GetJobUpdateDetails,
        Method::GetJobUpdateDiff,
        Method::GetTierConfigs,
        Method::CreateJob,
        Method::ScheduleCronJob,
        Method::DescheduleCronJob,
        Method::StartCronJob,
        Method::RestartShards,
        Method::KillTasks,
        Method::AddInstances,
        Method::ReplaceCronTemplate,
        Method::StartJobUpdate,
        Method::PauseJobUpdate,
        Method::ResumeJobUpdate,
        Method::AbortJobUpdate,
        Method::RollbackJobUpdate,
        Method::PulseJobUpdate,
        Method::SetQuota,
        Method::ForceTaskState,
        Method::PerformBackup,
        Method::ListBackups,
        Method::StageRecovery,
        Method::QueryRecovery,
        Method::DeleteRecoveryTasks,
        Method::CommitRecovery,
        Method::UnloadRecovery,
        Method::Snapshot,
        Method::TriggerExplicitTaskReconciliation,
        Method::TriggerImplicitTaskReconciliation,
        Method::PruneTasks,
        Method::StartMaintenance,
        Method::DrainHosts,
        Method::MaintenanceStatus,
        Method::EndMaintenance,
        Method::SlaDrainHosts,
    ];

    pub fn spec(self) -> MethodSpec {
        use MethodSpec as S;
        match self {
            Method::GetRoleSummary => S::fixed("getRoleSummary", 0),
            Method::GetJobSummary => S::fixed("getJobSummary", 1),
            Method::GetTasksStatus => S::fixed("getTasksStatus", 1),
            Method::GetTasksWithoutConfigs => S::fixed("getTasksWithoutConfigs", 1),
            Method::GetPendingReason => S::fixed("getPendingReason", 1),
            Method::GetConfigSummary => S::fixed("getConfigSummary", 1),
            Method::GetJobs => S::fixed("getJobs", 1),
            Method::GetQuota => S::fixed("getQuota", 1),
            Method::PopulateJobConfig => S::fixed("populateJobConfig", 1),
            Method::GetJobUpdateSummaries => S::fixed("getJobUpdateSummaries", 1),
            Method::GetJobUpdateDetails => S::padded("getJobUpdateDetails", 1),
            Method::GetJobUpdateDiff => S::fixed("getJobUpdateDiff", 1),
            Method::GetTierConfigs => S::fixed("getTierConfigs", 0),
            Method::CreateJob => S::fixed("createJob", 1),
            Method::ScheduleCronJob => S::fixed("scheduleCronJob", 1),
            Method::DescheduleCronJob => S::fixed("descheduleCronJob", 1),
            Method::StartCronJob => S::fixed("startCronJob", 1),
            Method::RestartShards => S::fixed("restartShards", 2),
            Method::KillTasks => S::padded("killTasks", 2),
            Method::AddInstances => S::fixed("addInstances", 2),
            Method::ReplaceCronTemplate => S::fixed("replaceCronTemplate", 1),
            Method::StartJobUpdate => S::padded("startJobUpdate", 1),
            Method::PauseJobUpdate => S::padded("pauseJobUpdate", 1),
            Method::ResumeJobUpdate => S::padded("resumeJobUpdate", 1),
            Method::AbortJobUpdate => S::padded("abortJobUpdate", 1),
            Method::RollbackJobUpdate => S::padded("rollbackJobUpdate", 1),
            Method::PulseJobUpdate => S::trailing("pulseJobUpdate", 1),
            Method::SetQuota => S::fixed("setQuota", 2),
            Method::ForceTaskState => S::fixed("forceTaskState", 2),
            Method::PerformBackup => S::fixed("performBackup", 0),
            Method::ListBackups => S::fixed("listBackups", 0),
            Method::StageRecovery => S::fixed("stageRecovery", 1),
            Method::QueryRecovery => S::fixed("queryRecovery", 1),
            Method::DeleteRecoveryTasks => S::fixed("deleteRecoveryTasks", 1),
            Method::CommitRecovery => S::fixed("commitRecovery", 0),
            Method::UnloadRecovery => S::fixed("unloadRecovery", 0),
            Method::Snapshot => S::fixed("snapshot", 0),
            Method::TriggerExplicitTaskReconciliation => {
                S::fixed("triggerExplicitTaskReconciliation", 1)
            }
            Method::TriggerImplicitTaskReconciliation => {
                S::fixed("triggerImplicitTaskReconciliation", 0)
            }
            Method::PruneTasks => S::fixed("pruneTasks", 1),
            Method::StartMaintenance => S::fixed("startMaintenance", 1),
            Method::DrainHosts => S::fixed("drainHosts", 1),
            Method::MaintenanceStatus => S::fixed("maintenanceStatus", 1),
            Method::EndMaintenance => S::fixed("endMaintenance", 1),
            Method::SlaDrainHosts => S::fixed("slaDrainHosts", 3),
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Look up a method by its wire name.
    pub fn from_name(name: &str) -> Option<Method> {
        Method::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Builders for Thrift JSON argument values.
pub mod arg {
    use serde_json::{json, Value};

    pub fn string(s: &str) -> Value {
        json!({ "str": s })
    }

    pub fn optional_string(s: Option<&str>) -> Value {
        s.map(string).unwrap_or(Value::Null)
    }

    pub fn i32(v: i32) -> Value {
        json!({ "i32": v })
    }

    /// An encoded struct, e.g. `{"1": {"str": "role"}}`.
    pub fn rec(fields: Value) -> Value {
        json!({ "rec": fields })
    }
}
