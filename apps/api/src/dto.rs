mod auth;
mod common;
mod invitations;
mod users;

pub use auth::{
    BootstrapRequest, ImpersonationRequest, InvitationSnapshotResponse,
    InvitationTokenStatusResponse, LoginRequest, ProvisionedAccountResponse, SignupRequest,
    ValidateInvitationRequest,
};
pub use common::{
    AccessCheckQuery, AccessCheckResponse, GenericMessageResponse, HealthResponse,
    SessionUserResponse, SessionViewResponse,
};
pub use invitations::{
    BulkInvitationFailureResponse, BulkInvitationReportResponse, BulkInvitationRequest,
    CreateInvitationRequest, InvitationResponse,
};
pub use users::{
    AssignRoleRequest, ChangeRoleRequest, PermissionChangeResponse, RoleAssignmentResponse,
    SetActiveRequest, UserResponse,
};
