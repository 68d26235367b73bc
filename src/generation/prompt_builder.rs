//! Prompt construction for panel images.

use crate::models::{GenerationParams, Panel, Prompt, Style};
use rand::Rng;

/// Scene text is cut to this many characters inside the positive prompt
pub const SCENE_PROMPT_CHARS: usize = 120;

/// Things the image model should avoid in every panel
pub const DEFAULT_NEGATIVE_PROMPT: &str = "text, watermark, logo, signature, blurry, lowres, artifacts, bad quality, cropped, error, jpeg artifacts, signature, username, letters, numbers";

/// Builds one prompt per panel with a random 32-bit seed
pub fn build_prompts_for_panels(panels: &[Panel], style: Style) -> Vec<Prompt> {
    build_prompts_with_rng(panels, style, &mut rand::thread_rng())
}

/// Same as [`build_prompts_for_panels`] with a caller-supplied RNG
pub fn build_prompts_with_rng<R: Rng + ?Sized>(
    panels: &[Panel],
    style: Style,
    rng: &mut R,
) -> Vec<Prompt> {
    panels
        .iter()
        .map(|panel| {
            let focus = panel.focus_line().unwrap_or("");
            let scene: String = panel.scene.chars().take(SCENE_PROMPT_CHARS).collect();
            let positive = format!("{}, {}, {}", style.base_prompt(), focus, scene);
            let seed = u64::from(rng.gen::<u32>());

            Prompt::new(positive, DEFAULT_NEGATIVE_PROMPT).with_seed(seed)
        })
        .collect()
}

/// Replaces every negative prompt when a non-empty override is given
pub fn apply_negative_override(prompts: &mut [Prompt], negative: Option<&str>) {
    let Some(negative) = negative.filter(|n| !n.is_empty()) else {
        return;
    };

    for prompt in prompts.iter_mut() {
        prompt.negative_prompt = negative.to_string();
    }
}

/// Copies the set generation parameters onto every prompt
pub fn apply_generation_params(prompts: &mut [Prompt], params: &GenerationParams) {
    for prompt in prompts.iter_mut() {
        if let Some(width) = params.width {
            prompt.width = Some(width);
        }
        if let Some(height) = params.height {
            prompt.height = Some(height);
        }
        if let Some(steps) = params.steps {
            prompt.steps = Some(steps);
        }
        if let Some(guidance) = params.guidance_scale {
            prompt.guidance_scale = Some(guidance);
        }
        if let Some(seed) = params.seed {
            prompt.seed = Some(seed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DialogueLine;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quiet_room() -> Panel {
        Panel::new(0, "A quiet room", vec![DialogueLine::unattributed("Hello")])
    }

    #[test]
    fn test_build_prompts_for_panels() {
        let prompts = build_prompts_for_panels(&[quiet_room()], Style::Manga);
        assert_eq!(prompts.len(), 1);
        assert_eq!(
            prompts[0].positive_prompt,
            "black and white manga panel, screentones, expressive characters, Hello, A quiet room"
        );
        assert_eq!(prompts[0].negative_prompt, DEFAULT_NEGATIVE_PROMPT);
        assert!(prompts[0].seed.unwrap() <= u64::from(u32::MAX));
    }

    #[test]
    fn test_no_dialogue_leaves_empty_focus() {
        let panel = Panel::new(0, "Rain on the roof", vec![]);
        let prompts = build_prompts_for_panels(&[panel], Style::Webtoon);
        assert_eq!(
            prompts[0].positive_prompt,
            "vertical webtoon, clean colors, soft shading, modern style, , Rain on the roof"
        );
    }

    #[test]
    fn test_scene_truncated_by_chars() {
        let scene = "é".repeat(200);
        let panel = Panel::new(0, scene, vec![]);
        let prompts = build_prompts_for_panels(&[panel], Style::American);
        let tail = prompts[0]
            .positive_prompt
            .rsplit(", ")
            .next()
            .unwrap()
            .to_string();
        assert_eq!(tail.chars().count(), SCENE_PROMPT_CHARS);
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let panels = vec![quiet_room(), quiet_room()];
        let a = build_prompts_with_rng(&panels, Style::Manga, &mut StdRng::seed_from_u64(1));
        let b = build_prompts_with_rng(&panels, Style::Manga, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_negative_override() {
        let mut prompts = build_prompts_for_panels(&[quiet_room()], Style::Manga);
        apply_negative_override(&mut prompts, Some(""));
        assert_eq!(prompts[0].negative_prompt, DEFAULT_NEGATIVE_PROMPT);

        apply_negative_override(&mut prompts, Some("blurry"));
        assert_eq!(prompts[0].negative_prompt, "blurry");
    }

    #[test]
    fn test_generation_params_applied() {
        let mut prompts = build_prompts_for_panels(&[quiet_room()], Style::Manga);
        let params = GenerationParams {
            width: Some(768),
            steps: Some(20),
            seed: Some(42),
            ..Default::default()
        };
        apply_generation_params(&mut prompts, &params);

        assert_eq!(prompts[0].width, Some(768));
        assert_eq!(prompts[0].height, None);
        assert_eq!(prompts[0].steps, Some(20));
        assert_eq!(prompts[0].seed, Some(42));
    }
}
