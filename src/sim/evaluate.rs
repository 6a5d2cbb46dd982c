//! Puzzle completion

use super::state::{Color, Scene};

/// True when the scene has targets and every one was hit in the last pass
pub fn is_complete(scene: &Scene) -> bool {
    !scene.targets.is_empty() && scene.targets.iter().all(|t| t.hit)
}

/// Hit / total target counts per color, in `Color` declaration order.
/// Colors without targets are left out.
pub fn hit_summary(scene: &Scene) -> Vec<(Color, usize, usize)> {
    [Color::White, Color::Red, Color::Green, Color::Blue]
        .into_iter()
        .filter_map(|color| {
            let (hit, total) = scene
                .targets
                .iter()
                .filter(|t| t.color == color)
                .fold((0, 0), |(hit, total), t| (hit + usize::from(t.hit), total + 1));
            (total > 0).then_some((color, hit, total))
        })
        .collect()
}
