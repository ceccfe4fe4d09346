use rand::seq::SliceRandom;
use rand::Rng;
use ratatui::{buffer::Buffer, layout::Rect, style::Color};

const SYMBOLS: [char; 6] = ['*', '+', '•', '✦', '◆', '~'];
const COLORS: [Color; 6] = [
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::LightRed,
    Color::LightBlue,
];
const GRAVITY: f64 = 0.9;
const BURST_SIZE: usize = 80;

/// One falling piece. Positions are fractions of the render area so a burst
/// survives terminal resizes.
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    vel_x: f64,
    vel_y: f64,
    pub symbol: char,
    pub color: Color,
    age: f64,
    max_age: f64,
}

impl Particle {
    fn random(rng: &mut impl Rng) -> Self {
        Self {
            x: rng.gen_range(0.3..0.7),
            y: rng.gen_range(0.45..0.6),
            vel_x: rng.gen_range(-0.35..0.35),
            vel_y: rng.gen_range(-0.9..-0.3),
            symbol: *SYMBOLS.choose(rng).unwrap_or(&'*'),
            color: *COLORS.choose(rng).unwrap_or(&Color::Green),
            age: 0.0,
            max_age: rng.gen_range(1.5..3.0),
        }
    }

    fn update(&mut self, dt: f64) -> bool {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_y += GRAVITY * dt;
        self.age += dt;
        self.age < self.max_age && (0.0..1.0).contains(&self.x) && self.y < 1.0
    }
}

/// Win burst, advanced by ticks and painted over the board.
#[derive(Debug, Default)]
pub struct Confetti {
    particles: Vec<Particle>,
}

impl Confetti {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        let mut rng = rand::thread_rng();
        self.particles = (0..BURST_SIZE).map(|_| Particle::random(&mut rng)).collect();
    }

    pub fn is_active(&self) -> bool {
        !self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn update(&mut self, dt: f64) {
        self.particles.retain_mut(|p| p.update(dt));
    }

    pub fn stop(&mut self) {
        self.particles.clear();
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        for p in &self.particles {
            if p.y < 0.0 {
                continue;
            }
            let x = area.x + (p.x * area.width as f64) as u16;
            let y = area.y + (p.y * area.height as f64) as u16;
            if x >= area.right() || y >= area.bottom() {
                continue;
            }
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_char(p.symbol).set_fg(p.color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_until_started() {
        let confetti = Confetti::new();
        assert!(!confetti.is_active());
    }

    #[test]
    fn burst_spawns_particles_inside_area() {
        let mut confetti = Confetti::new();
        confetti.start();
        assert_eq!(confetti.particles().len(), BURST_SIZE);
        assert!(confetti
            .particles()
            .iter()
            .all(|p| (0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y)));
    }

    #[test]
    fn burst_dies_out() {
        let mut confetti = Confetti::new();
        confetti.start();
        for _ in 0..100 {
            confetti.update(0.1);
        }
        assert!(!confetti.is_active());
    }

    #[test]
    fn render_stays_in_bounds() {
        let mut confetti = Confetti::new();
        confetti.start();
        let area = Rect::new(0, 0, 20, 10);
        let mut buf = Buffer::empty(area);
        for _ in 0..5 {
            confetti.render(area, &mut buf);
            confetti.update(0.2);
        }
    }
}
