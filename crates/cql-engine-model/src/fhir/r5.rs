//! FHIR R5 ModelInfo
//!
//! Same minimal-subset approach as [`crate::fhir::r4`]: the full HL7 R5
//! ModelInfo is not vendored here. Callers targeting a complete FHIR R5
//! model should load the official `FHIR-modelinfo-5.0.0.xml` via
//! [`ModelRegistry::from_xml_file`](crate::registry::ModelRegistry::from_xml_file).

use crate::model_info::ModelInfo;
use crate::provider::ModelProviderError;
use crate::registry::ModelRegistry;
use once_cell::sync::Lazy;

/// Minimal embedded FHIR R5 ModelInfo XML.
pub const FHIR_R5_MODEL_INFO_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<modelInfo name="FHIR" version="5.0.0" url="http://hl7.org/fhir"
           targetQualifier="fhir" patientClassName="Patient"
           patientBirthDatePropertyName="birthDate">
    <typeInfo name="Patient" retrievable="true" primaryCodePath="">
        <element name="id" type="String"/>
        <element name="birthDate" type="FHIR.date"/>
        <element name="gender" type="FHIR.code"/>
        <element name="name" type="list&lt;FHIR.HumanName&gt;"/>
    </typeInfo>
    <typeInfo name="Condition" retrievable="true" primaryCodePath="code">
        <element name="id" type="String"/>
        <element name="code" type="FHIR.CodeableConcept"/>
        <element name="subject" type="FHIR.Reference"/>
        <element name="onset" type="FHIR.dateTime"/>
        <element name="clinicalStatus" type="FHIR.CodeableConcept"/>
    </typeInfo>
    <typeInfo name="Observation" retrievable="true" primaryCodePath="code">
        <element name="id" type="String"/>
        <element name="code" type="FHIR.CodeableConcept"/>
        <element name="subject" type="FHIR.Reference"/>
        <element name="effective" type="FHIR.dateTime"/>
        <element name="value" type="FHIR.Quantity"/>
        <element name="status" type="FHIR.code"/>
    </typeInfo>
    <typeInfo name="Encounter" retrievable="true" primaryCodePath="type">
        <element name="id" type="String"/>
        <element name="type" type="list&lt;FHIR.CodeableConcept&gt;"/>
        <element name="subject" type="FHIR.Reference"/>
        <element name="period" type="FHIR.Period"/>
        <element name="status" type="FHIR.code"/>
    </typeInfo>
    <typeInfo name="MedicationRequest" retrievable="true" primaryCodePath="medication">
        <element name="id" type="String"/>
        <element name="medication" type="FHIR.CodeableConcept"/>
        <element name="subject" type="FHIR.Reference"/>
        <element name="authoredOn" type="FHIR.dateTime"/>
        <element name="status" type="FHIR.code"/>
    </typeInfo>
</modelInfo>
"#;

/// Lazily parsed minimal FHIR R5 model registry.
pub static FHIR_R5_REGISTRY: Lazy<Result<ModelRegistry, ModelProviderError>> =
    Lazy::new(|| ModelRegistry::from_xml(FHIR_R5_MODEL_INFO_XML));

/// Get the minimal FHIR R5 model registry.
pub fn fhir_r5_registry() -> Result<ModelRegistry, ModelProviderError> {
    FHIR_R5_REGISTRY.clone()
}

/// Parse the minimal embedded FHIR R5 ModelInfo.
pub fn load_fhir_r5_model_info() -> Result<ModelInfo, ModelProviderError> {
    crate::model_info::parse_xml(FHIR_R5_MODEL_INFO_XML)
        .map_err(|e| ModelProviderError::ParseError(e.to_string()))
}
