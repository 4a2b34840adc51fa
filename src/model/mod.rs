//! State records and their conversions to and from Graph models.

pub mod application;
pub mod branding;
pub mod certificate;
pub mod key;
pub mod keyset;

pub use application::{
    ApplicationData, ApplicationPatchState, PatchError, PatchTemplates,
    SamlApplicationPatchState, TrustframeworkApplicationPatchState,
};
pub use branding::{BrandingImages, BrandingLocalizationState, Populated};
pub use certificate::{CertificateData, KeySetCertificateDataState, KeySetCertificateState};
pub use key::{KeyData, KeyRequest, KeySetKeyDataState, KeySetKeyState};
pub use keyset::{
    key_set_id, key_set_name, single_key, KeySetMetadata, KeySetResourceState, KeySetState, KeyState,
};
