/// Celebration particles: a burst of coloured dots that fly out, fall
/// under gravity and fade. Purely cosmetic; positions are in board grid
/// units (1.0 = one card) and the renderer scales them to the screen.

use rand::Rng;

const BURST_SIZE: usize = 50;
const GRAVITY: f32 = 0.004;
const LIFETIME: u32 = 45;
/// Number of palette slots; the renderer owns the actual colours.
pub const PALETTE_LEN: u8 = 5;

#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,  // 0.0..1.0, picks the glyph
    pub color: u8,  // palette index
    pub life: u32,
}

impl Particle {
    /// Remaining life as 1.0 (fresh) → 0.0 (gone).
    pub fn fade(&self) -> f32 {
        self.life as f32 / LIFETIME as f32
    }
}

#[derive(Clone, Debug, Default)]
pub struct ParticleField {
    pub particles: Vec<Particle>,
}

impl ParticleField {
    pub fn new() -> Self {
        ParticleField::default()
    }

    /// Spawn a burst centred on (x, y).
    pub fn burst<R: Rng + ?Sized>(&mut self, x: f32, y: f32, rng: &mut R) {
        self.particles.reserve(BURST_SIZE);
        for _ in 0..BURST_SIZE {
            let angle: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
            let speed: f32 = rng.gen_range(0.04..0.12);
            self.particles.push(Particle {
                x,
                y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                size: rng.gen_range(0.0..1.0),
                color: rng.gen_range(0..PALETTE_LEN),
                life: LIFETIME,
            });
        }
    }

    /// Advance one tick: move, apply gravity, drop dead particles.
    pub fn update(&mut self) {
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;
            p.vy += GRAVITY;
            p.life = p.life.saturating_sub(1);
        }
        self.particles.retain(|p| p.life > 0);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn burst_spawns_full_set_at_origin() {
        let mut field = ParticleField::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        field.burst(2.5, 2.0, &mut rng);
        assert_eq!(field.particles.len(), BURST_SIZE);
        assert!(field.particles.iter().all(|p| p.x == 2.5 && p.y == 2.0));
        assert!(field.particles.iter().all(|p| p.color < PALETTE_LEN));
    }

    #[test]
    fn particles_fall_and_expire() {
        let mut field = ParticleField::new();
        field.particles.push(Particle {
            x: 0.0, y: 0.0, vx: 0.0, vy: 0.0,
            size: 0.5, color: 0, life: 3,
        });
        // Position moves before gravity applies
        field.update();
        assert_eq!(field.particles[0].y, 0.0);
        assert!(field.particles[0].vy > 0.0);
        field.update();
        assert!(field.particles[0].y > 0.0);
        field.update();
        assert!(field.is_empty());
    }

    #[test]
    fn fade_runs_from_one_to_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut field = ParticleField::new();
        field.burst(0.0, 0.0, &mut rng);
        assert!((field.particles[0].fade() - 1.0).abs() < 1e-6);
        for _ in 0..LIFETIME { field.update(); }
        assert!(field.is_empty());
    }
}
