//! Unit‑tests for the Metropolis update rule and global observables.

use potts::lattice::Lattice;
use potts::metropolis::{delta_energy, order_parameter, sweep, total_energy};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_pcg::Pcg64;

proptest! {
    #[test]
    fn delta_is_zero_for_unchanged_state(
        l in 1usize..10,
        q in 2usize..6,
        seed in any::<u64>(),
        site in any::<(usize, usize)>(),
    ) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let lat = Lattice::random_with(&mut rng, l, q);
        let (i, j) = (site.0 % l, site.1 % l);
        prop_assert_eq!(delta_energy(&lat, i, j, lat.get(i, j)), 0);
    }

    #[test]
    fn delta_matches_recomputed_energy(
        l in 2usize..8,
        q in 2usize..5,
        seed in any::<u64>(),
        site in any::<(usize, usize)>(),
        candidate in 0u8..5,
    ) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut lat = Lattice::random_with(&mut rng, l, q);
        let (i, j) = (site.0 % l, site.1 % l);
        let candidate = candidate % q as u8;

        let before = total_energy(&lat);
        let de = delta_energy(&lat, i, j, candidate);
        lat.set(i, j, candidate);
        prop_assert_eq!(total_energy(&lat), before + de);
    }
}

#[test]
fn ordered_lattice_has_ground_state_energy() {
    for l in [1, 2, 3, 8] {
        let lat = Lattice::uniform(l, 3, 1);
        assert_eq!(total_energy(&lat), -2 * (l * l) as i64, "L = {l}");
    }
}

#[test]
fn checkerboard_has_zero_energy() {
    let spins = (0..16).map(|k| ((k / 4 + k % 4) % 2) as u8).collect();
    let lat = Lattice::from_spins(4, 2, spins).unwrap();
    assert_eq!(total_energy(&lat), 0);
    // Flipping one site aligns it with all four neighbours.
    assert_eq!(delta_energy(&lat, 1, 1, lat.get(0, 1)), -4);
}

#[test]
fn sweep_energy_is_conserved() {
    // Recomputing from scratch must equal the running sum of accepted deltas.
    let mut rng = ChaCha20Rng::seed_from_u64(0xDEADBEEF);
    for (q, l, t) in [(2, 6, 0.9), (3, 5, 1.0), (4, 7, 0.6), (2, 2, 1.5)] {
        let mut lat = Lattice::random_with(&mut rng, l, q);
        let mut energy = total_energy(&lat);
        for _ in 0..50 {
            let stats = sweep(&mut lat, t, &mut rng);
            energy += stats.delta_energy;
            assert_eq!(energy, total_energy(&lat), "q={q} L={l} T={t}");
        }
    }
}

#[test]
fn sweep_attempts_one_update_per_site() {
    let mut rng = Pcg64::seed_from_u64(42);
    let mut lat = Lattice::random_with(&mut rng, 9, 3);
    let stats = sweep(&mut lat, 1.0, &mut rng);
    assert_eq!(stats.attempted, 81);
    assert!(stats.accepted <= stats.attempted);
    assert!(lat.spins().iter().all(|&s| s < 3));
}

#[test]
fn high_temperature_acceptance_is_large() {
    let mut rng = Pcg64::seed_from_u64(1);
    let mut lat = Lattice::random_with(&mut rng, 16, 2);
    let mut accepted = 0;
    let mut attempted = 0;
    for _ in 0..20 {
        let s = sweep(&mut lat, 100.0, &mut rng);
        accepted += s.accepted;
        attempted += s.attempted;
    }
    let rate = accepted as f64 / attempted as f64;
    assert!(rate > 0.9, "acceptance {rate:.3} too small at T* = 100");
}

#[test]
fn low_temperature_orders_the_lattice() {
    let mut rng = ChaCha20Rng::seed_from_u64(3);
    let mut lat = Lattice::random_with(&mut rng, 8, 2);
    for _ in 0..2_000 {
        sweep(&mut lat, 0.6, &mut rng);
    }
    assert!(order_parameter(&lat) > 0.8);
}

#[test]
fn order_parameter_endpoints_are_exact() {
    assert_eq!(order_parameter(&Lattice::uniform(5, 3, 2)), 1.0);

    // Perfectly even occupation: L² divisible by q.
    let spins = (0..9).map(|k| (k % 3) as u8).collect();
    assert_eq!(order_parameter(&Lattice::from_spins(3, 3, spins).unwrap()), 0.0);

    let spins = (0..16).map(|k| (k % 4) as u8).collect();
    assert_eq!(order_parameter(&Lattice::from_spins(4, 4, spins).unwrap()), 0.0);

    let spins = (0..16).map(|k| (k % 2) as u8).collect();
    assert_eq!(order_parameter(&Lattice::from_spins(4, 2, spins).unwrap()), 0.0);
}

#[test]
fn order_parameter_is_in_unit_interval() {
    let mut rng = ChaCha20Rng::seed_from_u64(11);
    for q in 2..6 {
        let lat = Lattice::random_with(&mut rng, 7, q);
        let m = order_parameter(&lat);
        assert!((0.0..=1.0).contains(&m), "m = {m} for q = {q}");
    }
}

#[test]
fn single_site_lattice_accepts_every_proposal() {
    let mut rng = Pcg64::seed_from_u64(11);
    let mut lat = Lattice::random_with(&mut rng, 1, 4);
    for candidate in 0..4 {
        assert_eq!(delta_energy(&lat, 0, 0, candidate), 0);
    }
    for t_star in [0.05, 1.0, 50.0] {
        let stats = sweep(&mut lat, t_star, &mut rng);
        assert_eq!(stats.attempted, 1);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.delta_energy, 0);
        assert_eq!(stats.acceptance_rate(), 1.0);
        assert_eq!(total_energy(&lat), -2);
    }
}
