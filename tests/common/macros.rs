/// Asserts that every particle position and velocity is finite.
#[macro_export]
macro_rules! assert_all_finite {
    ($particles:expr) => {
        for p in $particles.iter() {
            assert!(
                p.position.is_finite(),
                "Particle {} position {:?} is not finite",
                p.id,
                p.position
            );
            assert!(
                p.velocity.is_finite(),
                "Particle {} velocity {:?} is not finite",
                p.id,
                p.velocity
            );
        }
    };
}

/// Asserts that two particle sets are bit-identical in position and velocity.
#[macro_export]
macro_rules! assert_bit_identical {
    ($a:expr, $b:expr) => {
        assert_eq!($a.len(), $b.len(), "Particle counts differ");
        for (pa, pb) in $a.iter().zip($b.iter()) {
            assert_eq!(pa.id, pb.id, "Particle order differs");
            for axis in 0..3 {
                assert_eq!(
                    pa.position[axis].to_bits(),
                    pb.position[axis].to_bits(),
                    "Particle {} position differs on axis {}",
                    pa.id,
                    axis
                );
                assert_eq!(
                    pa.velocity[axis].to_bits(),
                    pb.velocity[axis].to_bits(),
                    "Particle {} velocity differs on axis {}",
                    pa.id,
                    axis
                );
            }
        }
    };
}
