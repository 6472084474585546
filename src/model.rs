use serde::{Deserialize, Serialize};


/// Source-model / reasoning-mode / content-type combination. Each variant is a
/// sub-directory of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelVariant {
    QwenCotVideoImageInfo,
    QwenCotVideoImageRaw,
    QwenCotDescriptionInfo,
    QwenVideoImageInfo,
    QwenVideoImageRaw,
    QwenDescriptionInfo,
    SmolCotVideoImageInfo,
    SmolCotVideoImageRaw,
    SmolCotDescriptionInfo,
    SmolVideoImageInfo,
    SmolVideoImageRaw,
    SmolDescriptionInfo,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 12] = [
        ModelVariant::QwenCotVideoImageInfo,
        ModelVariant::QwenCotVideoImageRaw,
        ModelVariant::QwenCotDescriptionInfo,
        ModelVariant::QwenVideoImageInfo,
        ModelVariant::QwenVideoImageRaw,
        ModelVariant::QwenDescriptionInfo,
        ModelVariant::SmolCotVideoImageInfo,
        ModelVariant::SmolCotVideoImageRaw,
        ModelVariant::SmolCotDescriptionInfo,
        ModelVariant::SmolVideoImageInfo,
        ModelVariant::SmolVideoImageRaw,
        ModelVariant::SmolDescriptionInfo,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|variant| variant.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::QwenCotVideoImageInfo => "qwen_CoT_video_image_info",
            ModelVariant::QwenCotVideoImageRaw => "qwen_CoT_video_image_raw",
            ModelVariant::QwenCotDescriptionInfo => "qwen_CoT_description_info",
            ModelVariant::QwenVideoImageInfo => "qwen_video_image_info",
            ModelVariant::QwenVideoImageRaw => "qwen_video_image_raw",
            ModelVariant::QwenDescriptionInfo => "qwen_description_info",
            ModelVariant::SmolCotVideoImageInfo => "smol_CoT_video_image_info",
            ModelVariant::SmolCotVideoImageRaw => "smol_CoT_video_image_raw",
            ModelVariant::SmolCotDescriptionInfo => "smol_CoT_description_info",
            ModelVariant::SmolVideoImageInfo => "smol_video_image_info",
            ModelVariant::SmolVideoImageRaw => "smol_video_image_raw",
            ModelVariant::SmolDescriptionInfo => "smol_description_info",
        }
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}


/// Human judgement for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Yes,
    #[serde(rename = "N/A")]
    NotApplicable,
    No,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Yes, Label::NotApplicable, Label::No];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Yes" => Some(Label::Yes),
            "N/A" => Some(Label::NotApplicable),
            "No" => Some(Label::No),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Yes => "Yes",
            Label::NotApplicable => "N/A",
            Label::No => "No",
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    VideoDescription,
    ProductInfo,
    Judgement,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [
        TableKind::VideoDescription,
        TableKind::ProductInfo,
        TableKind::Judgement,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TableKind::VideoDescription => "video_description",
            TableKind::ProductInfo => "product_info",
            TableKind::Judgement => "judgement",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name())
    }

    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            TableKind::VideoDescription => &[
                "product_id",
                "description_key1",
                "description_key2",
                "description_key3",
            ],
            TableKind::ProductInfo => &["product_id", "brand", "price", "spec", "category"],
            TableKind::Judgement => &[
                "product_id",
                "product_name",
                "category",
                "video_url",
                "thumbnail_url",
                "ground_truth_image_url",
                "label",
                "reason",
            ],
        }
    }
}
