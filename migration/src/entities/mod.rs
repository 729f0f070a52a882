pub mod audit_log;
pub mod restaurant;
pub mod sop_attachment;
pub mod sop_category;
pub mod sop_document;
pub mod staff;
pub mod training_certificate;
pub mod training_module;
pub mod training_progress;
pub mod translation;
pub mod translation_history;
pub mod translation_key;

pub use audit_log::Entity as AuditLogEntity;
pub use restaurant::Entity as RestaurantEntity;
pub use sop_attachment::Entity as SopAttachmentEntity;
pub use sop_category::Entity as SopCategoryEntity;
pub use sop_document::Entity as SopDocumentEntity;
pub use staff::Entity as StaffEntity;
pub use training_certificate::Entity as TrainingCertificateEntity;
pub use training_module::Entity as TrainingModuleEntity;
pub use training_progress::Entity as TrainingProgressEntity;
pub use translation::Entity as TranslationEntity;
pub use translation_history::Entity as TranslationHistoryEntity;
pub use translation_key::Entity as TranslationKeyEntity;
