pub mod admin;
pub mod otp_code;
pub mod registration;
pub mod submission;
pub mod survey;
pub mod survey_click;
pub mod survey_link;

pub use admin::Entity as AdminEntity;
pub use otp_code::Entity as OtpCodeEntity;
pub use registration::Entity as RegistrationEntity;
pub use submission::Entity as SubmissionEntity;
pub use survey::Entity as SurveyEntity;
pub use survey_click::Entity as SurveyClickEntity;
pub use survey_link::Entity as SurveyLinkEntity;
