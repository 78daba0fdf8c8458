//! The job description submitted to a stitching host.
//!
//! The host composes eight segments:
//! `const_000, plc_000 + greeting, const_001, nodding + doctor 1, const_002,
//! nodding + doctor 2, plc_001 + thank-you, const_003`. The payload lists the
//! inputs for each and where to upload and report the result.

use blusanta_core::language::VideoLanguage;
use blusanta_core::storage_paths::{
    audio_object, final_video_object, gs_url, podcast_background, public_url, template_folder,
    AudioClip,
};
use blusanta_core::types::DbId;
use serde::Serialize;

/// Route on the API server that receives completion notices.
pub const COMPLETION_WEBHOOK_PATH: &str = "/api/blusanta/update-after-stitching";

const CONSTANT_CLIPS: [&str; 4] = ["const_000", "const_001", "const_002", "const_003"];
const PLACEHOLDER_CLIPS: [&str; 2] = ["plc_000", "plc_001"];
const NODDING_CLIP: &str = "nodding";

/// Constant template clips for one language.
#[derive(Debug, Clone)]
pub struct TemplateAssets {
    folder: String,
}

impl TemplateAssets {
    pub fn for_language(bucket: &str, language: VideoLanguage) -> Self {
        Self {
            folder: template_folder(bucket, language),
        }
    }

    fn clip(&self, name: &str) -> String {
        format!("{}/{name}.mp4", self.folder)
    }

    pub fn constant_clips(&self) -> Vec<String> {
        CONSTANT_CLIPS.iter().map(|c| self.clip(c)).collect()
    }

    pub fn placeholder_clips(&self) -> Vec<String> {
        PLACEHOLDER_CLIPS.iter().map(|c| self.clip(c)).collect()
    }

    pub fn nodding_clip(&self) -> String {
        self.clip(NODDING_CLIP)
    }
}

/// Echoed back by the host in the completion webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionData {
    pub id: DbId,
    pub final_video_url: String,
    #[serde(rename = "drFirstName")]
    pub dr_first_name: String,
    #[serde(rename = "drLastName")]
    pub dr_last_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StitchingJobPayload {
    pub constant_video_paths: Vec<String>,
    pub placeholder_video_paths: Vec<String>,
    pub nodding_video_path: String,
    pub doctor_video_paths: Vec<String>,
    pub greeting_audio_path: String,
    pub thank_you_audio_path: String,
    pub podcast_background: String,
    pub final_upload_path: String,
    pub webhook_url: String,
    pub additional_data: CompletionData,
}

/// Per-assessment values a payload is built from.
#[derive(Debug, Clone)]
pub struct StitchJobInputs<'a> {
    pub assessment_id: DbId,
    pub employee_code: &'a str,
    pub dr_code: &'a str,
    pub dr_first_name: &'a str,
    pub dr_last_name: &'a str,
    pub language: VideoLanguage,
    /// Response videos, already normalized to `gs://` form.
    pub doctor_videos: [String; 2],
    pub bucket: &'a str,
    pub webhook_base_url: &'a str,
}

impl StitchJobInputs<'_> {
    pub fn greeting_audio_url(&self) -> String {
        self.audio_url(AudioClip::Greeting)
    }

    pub fn thank_you_audio_url(&self) -> String {
        self.audio_url(AudioClip::ThankYou)
    }

    fn audio_url(&self, clip: AudioClip) -> String {
        gs_url(
            self.bucket,
            &audio_object(self.language, self.employee_code, self.dr_code, clip),
        )
    }

    fn final_object(&self) -> String {
        final_video_object(self.language, self.employee_code, self.dr_code)
    }

    /// The four per-assessment inputs that must exist before submission.
    pub fn assets_to_validate(&self) -> Vec<String> {
        vec![
            self.greeting_audio_url(),
            self.thank_you_audio_url(),
            self.doctor_videos[0].clone(),
            self.doctor_videos[1].clone(),
        ]
    }
}

impl StitchingJobPayload {
    pub fn build(inputs: &StitchJobInputs<'_>) -> Self {
        let assets = TemplateAssets::for_language(inputs.bucket, inputs.language);
        let final_object = inputs.final_object();
        Self {
            constant_video_paths: assets.constant_clips(),
            placeholder_video_paths: assets.placeholder_clips(),
            nodding_video_path: assets.nodding_clip(),
            doctor_video_paths: inputs.doctor_videos.to_vec(),
            greeting_audio_path: inputs.greeting_audio_url(),
            thank_you_audio_path: inputs.thank_you_audio_url(),
            podcast_background: podcast_background(inputs.bucket),
            final_upload_path: gs_url(inputs.bucket, &final_object),
            webhook_url: format!(
                "{}{COMPLETION_WEBHOOK_PATH}",
                inputs.webhook_base_url.trim_end_matches('/')
            ),
            additional_data: CompletionData {
                id: inputs.assessment_id,
                final_video_url: public_url(inputs.bucket, &final_object),
                dr_first_name: inputs.dr_first_name.to_string(),
                dr_last_name: inputs.dr_last_name.to_string(),
            },
        }
    }
}
