pub mod auth;
pub mod calendar;
pub mod envelope;
pub mod patient;
pub mod timestamp;
pub mod user;

pub use auth::{
    AvatarResponse, AvatarUpdate, LoginRequest, LoginResponse, PasswordUpdate, ProfileUpdate,
    RegisterRequest, RoleUpdate, TokenPayload, UserPayload, UserPage,
};
pub use calendar::{CalendarData, CalendarDay, CalendarWeek, CurrentCalendar, MultiMonthCalendar};
pub use envelope::{ApiResponse, ErrorDetails, MetaPagination, Rejection, ResponseMeta};
pub use patient::{
    AddressCount, NewPatient, Pagination, Patient, PatientPage, PatientPayload, PatientStatistics,
    PatientSummary, PatientUpdate, StatisticsReport,
};
pub use timestamp::Timestamp;
pub use user::{Avatar, Permission, Role, User, has_permission, is_admin, is_user};
