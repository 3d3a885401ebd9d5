// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line option flags and how they map onto typed tool options.

use clap::Args;
use falzwerk_core::{
    CompressionLevel, ImageQuality, RotationAngle, SplitMode, ToolOptions, WatermarkPosition,
};

/// Per-tool option flags. Each tool reads only the flags that apply to it.
#[derive(Debug, Clone, Default, Args)]
pub struct OptionArgs {
    /// Split: select a page range or copy every page (range, all)
    #[arg(long)]
    pub split_mode: Option<SplitMode>,

    /// Split: pages to keep, e.g. "1-3,5,7-9"
    #[arg(long)]
    pub pages: Option<String>,

    /// Compress: re-encoding batch granularity (low, medium, high)
    #[arg(long)]
    pub level: Option<CompressionLevel>,

    /// PDF to JPG: render quality (high, medium, low)
    #[arg(long)]
    pub quality: Option<ImageQuality>,

    /// Rotate: clockwise angle (90, 180, 270)
    #[arg(long)]
    pub angle: Option<RotationAngle>,

    /// Watermark: text to draw on every page
    #[arg(long)]
    pub text: Option<String>,

    /// Watermark: vertical position (center, top, bottom)
    #[arg(long)]
    pub position: Option<WatermarkPosition>,
}

impl OptionArgs {
    /// Overlay the given flags on `base`. Returns the merged options and the
    /// names of flags the tool does not use.
    pub fn apply(&self, base: ToolOptions) -> (ToolOptions, Vec<&'static str>) {
        let mut used: Vec<&'static str> = Vec::new();

        let options = match base {
            ToolOptions::Split(mut split) => {
                if let Some(mode) = self.split_mode {
                    split.mode = mode;
                    used.push("--split-mode");
                }
                if let Some(pages) = &self.pages {
                    split.range = pages.clone();
                    used.push("--pages");
                }
                ToolOptions::Split(split)
            }
            ToolOptions::Compress(mut compress) => {
                if let Some(level) = self.level {
                    compress.level = level;
                    used.push("--level");
                }
                ToolOptions::Compress(compress)
            }
            ToolOptions::DocToImage(mut render) => {
                if let Some(quality) = self.quality {
                    render.quality = quality;
                    used.push("--quality");
                }
                ToolOptions::DocToImage(render)
            }
            ToolOptions::Rotate(mut rotate) => {
                if let Some(angle) = self.angle {
                    rotate.angle = angle;
                    used.push("--angle");
                }
                ToolOptions::Rotate(rotate)
            }
            ToolOptions::Watermark(mut watermark) => {
                if let Some(text) = &self.text {
                    watermark.text = text.clone();
                    used.push("--text");
                }
                if let Some(position) = self.position {
                    watermark.position = position;
                    used.push("--position");
                }
                ToolOptions::Watermark(watermark)
            }
            other => other,
        };

        let ignored = self
            .given()
            .into_iter()
            .filter(|flag| !used.contains(flag))
            .collect();
        (options, ignored)
    }

    fn given(&self) -> Vec<&'static str> {
        [
            ("--split-mode", self.split_mode.is_some()),
            ("--pages", self.pages.is_some()),
            ("--level", self.level.is_some()),
            ("--quality", self.quality.is_some()),
            ("--angle", self.angle.is_some()),
            ("--text", self.text.is_some()),
            ("--position", self.position.is_some()),
        ]
        .into_iter()
        .filter_map(|(flag, set)| set.then_some(flag))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use falzwerk_core::{SplitOptions, ToolKind, WatermarkOptions};

    #[test]
    fn split_flags_fill_split_options() {
        let args = OptionArgs {
            split_mode: Some(SplitMode::Range),
            pages: Some("2-4".into()),
            ..OptionArgs::default()
        };
        let (options, ignored) = args.apply(ToolOptions::defaults_for(ToolKind::Split));

        assert_eq!(
            options,
            ToolOptions::Split(SplitOptions {
                mode: SplitMode::Range,
                range: "2-4".into()
            })
        );
        assert!(ignored.is_empty());
    }

    #[test]
    fn unset_flags_keep_the_base_values() {
        let args = OptionArgs {
            text: Some("DRAFT".into()),
            ..OptionArgs::default()
        };
        let (options, _) = args.apply(ToolOptions::defaults_for(ToolKind::Watermark));
        assert_eq!(
            options,
            ToolOptions::Watermark(WatermarkOptions {
                text: "DRAFT".into(),
                position: WatermarkPosition::Center,
            })
        );
    }

    #[test]
    fn flags_for_other_tools_are_reported() {
        let args = OptionArgs {
            angle: Some(RotationAngle::Deg180),
            level: Some(CompressionLevel::Low),
            ..OptionArgs::default()
        };
        let (options, ignored) = args.apply(ToolOptions::Merge);
        assert_eq!(options, ToolOptions::Merge);
        assert_eq!(ignored, ["--level", "--angle"]);
    }
}
