//! SVG projection of the robot pose.

use serde::Serialize;

use crate::emotion::Emotion;
use crate::motion::RobotPose;

pub const SCENE_WIDTH: f64 = 400.0;
pub const SCENE_HEIGHT: f64 = 300.0;
/// Scene coordinates of the arena origin
pub const ORIGIN: (f64, f64) = (200.0, 150.0);
pub const PIXELS_PER_UNIT: f64 = 50.0;

/// Body and accent colors for one emotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub body: &'static str,
    pub accent: &'static str,
}

impl Palette {
    pub fn for_emotion(emotion: Emotion) -> Self {
        let (body, accent) = match emotion {
            Emotion::Neutral => ("#4a90e2", "#2c5aa0"),
            Emotion::Happy => ("#f5a623", "#c77c02"),
            Emotion::Angry => ("#d0021b", "#8b0000"),
            Emotion::Sad => ("#7b8fa1", "#4a5a6a"),
        };
        Self { body, accent }
    }
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub body_x: f64,
    pub body_y: f64,
    pub rotation_deg: f64,
    pub palette: Palette,
    pub pose: RobotPose,
}

/// Project a pose onto the scene. Pure and deterministic.
pub fn project(pose: &RobotPose, emotion: Emotion) -> Scene {
    Scene {
        body_x: ORIGIN.0 + pose.x * PIXELS_PER_UNIT,
        body_y: ORIGIN.1 + pose.y * PIXELS_PER_UNIT,
        rotation_deg: pose.heading.to_degrees(),
        palette: Palette::for_emotion(emotion),
        pose: *pose,
    }
}

/// One-decimal label text; never prints "-0.0" for an exact zero.
fn label(v: f64) -> String {
    format!("{:.1}", v + 0.0)
}

impl Scene {
    pub fn to_svg(&self) -> String {
        let Palette { body, accent } = self.palette;
        format!(
            r##"<svg width="{w}" height="{h}" xmlns="http://www.w3.org/2000/svg">
  <rect width="{w}" height="{h}" fill="white"/>
  <g transform="translate({bx}, {by}) rotate({rot})">
    <circle cx="0" cy="0" r="20" fill="{body}" stroke="{accent}" stroke-width="2"/>
    <polygon points="15,0 25,5 25,-5" fill="{accent}"/>
    <circle cx="-8" cy="-8" r="3" fill="white"/>
    <circle cx="8" cy="-8" r="3" fill="white"/>
    <circle cx="-8" cy="-8" r="1" fill="black"/>
    <circle cx="8" cy="-8" r="1" fill="black"/>
  </g>
  <text x="10" y="20" font-family="Arial" font-size="12" fill="#333">Position: ({px}, {py})</text>
  <text x="10" y="35" font-family="Arial" font-size="12" fill="#333">Rotation: {rot_label}°</text>
</svg>"##,
            w = SCENE_WIDTH,
            h = SCENE_HEIGHT,
            bx = self.body_x,
            by = self.body_y,
            rot = self.rotation_deg,
            px = label(self.pose.x),
            py = label(self.pose.y),
            rot_label = label(self.rotation_deg),
        )
    }
}

/// Convenience: project and serialise in one go.
pub fn render_svg(pose: &RobotPose, emotion: Emotion) -> String {
    project(pose, emotion).to_svg()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_projects_to_center() {
        let scene = project(&RobotPose::default(), Emotion::Neutral);
        assert_eq!(scene.body_x, 200.0);
        assert_eq!(scene.body_y, 150.0);
        assert_eq!(scene.rotation_deg, 0.0);
    }

    #[test]
    fn test_pose_scaling() {
        let pose = RobotPose {
            x: 1.0,
            y: -1.0,
            heading: std::f64::consts::PI,
        };
        let scene = project(&pose, Emotion::Happy);
        assert_eq!(scene.body_x, 250.0);
        assert_eq!(scene.body_y, 100.0);
        assert!((scene.rotation_deg - 180.0).abs() < 1e-9);
        assert_eq!(scene.palette, Palette::for_emotion(Emotion::Happy));
    }

    #[test]
    fn test_palettes_are_distinct() {
        let bodies: std::collections::HashSet<_> =
            [Emotion::Neutral, Emotion::Happy, Emotion::Angry, Emotion::Sad]
                .iter()
                .map(|e| Palette::for_emotion(*e).body)
                .collect();
        assert_eq!(bodies.len(), 4);
    }

    #[test]
    fn test_svg_contents() {
        let pose = RobotPose {
            x: 0.15,
            y: 0.0,
            heading: 0.0,
        };
        let svg = render_svg(&pose, Emotion::Angry);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("translate(207.5, 150) rotate(0)"));
        assert!(svg.contains(r##"fill="#d0021b""##));
        assert!(svg.contains("Position: (0.1, 0.0)"));
        assert!(svg.contains("Rotation: 0.0°"));
    }

    #[test]
    fn test_negative_zero_label() {
        assert_eq!(label(-0.0), "0.0");
        assert_eq!(label(1.26), "1.3");
    }

    #[test]
    fn test_render_is_deterministic() {
        let pose = RobotPose {
            x: -2.0,
            y: 1.0,
            heading: -0.5,
        };
        assert_eq!(render_svg(&pose, Emotion::Sad), render_svg(&pose, Emotion::Sad));
    }
}
