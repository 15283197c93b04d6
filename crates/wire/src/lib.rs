// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! armada-wire: serde DTOs for the worker↔primary HTTP API, the admin API,
//! and the socket notification channels.
//!
//! Field names here are wire contract, stable across versions. Optional
//! fields default on deserialization so newer peers can talk to older ones.

mod admin;
mod sync;
mod worker_api;

pub use admin::{
    ClusterStatus, CreateRoleRequest, CreateTokenRequest, CreateTokenResponse, CreateUserRequest,
    ErrorBody, JobListResponse, JobSubmitResponse, LoginRequest, LoginResponse, SessionInfo,
    TokenEntry, UpdateUserRequest, UserEntry, WorkerListResponse,
};
pub use sync::{FileEntry, ManifestResponse, RevisionInfo, SocketFrame, UiEvent};
pub use worker_api::{
    ActiveJob, AssignedJobsResponse, CheckinRequest, CheckinResponse, CompleteJobRequest,
    CompleteJobResponse, RegisterRequest, RegisterResponse, StartJobRequest, StartJobResponse,
    StreamLogRequest,
};
