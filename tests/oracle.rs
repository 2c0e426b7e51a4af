use approx::assert_abs_diff_eq;
use rabi_sim::{
    analytical_inversion,
    Atom,
    Config,
    Field,
    PhotonDist,
    Simulation,
    System,
};

const THR: f64 = 0.001;

fn coherent_field_simulation() -> Simulation {
    let field = Field::new(5, PhotonDist::Poisson, 50).unwrap();
    let atom = Atom::new(1.0, 0.0).unwrap();
    let system = System::new(field, atom, 1.0, 0.0).unwrap();
    Simulation::new(system, 100.0, 0.01).unwrap()
}

#[test]
fn coherent_field_matches_closed_form() {
    let sim = coherent_field_simulation();
    let numerical = sim.run_par().unwrap();
    let analytical = analytical_inversion(&sim.system, sim.time());
    assert_eq!(numerical.len(), 10000);
    assert_eq!(analytical.len(), numerical.len());
    assert_abs_diff_eq!(numerical.values()[0], analytical[0], epsilon = THR);
    for (wn, wa) in numerical.values().iter().zip(analytical.iter()) {
        assert_abs_diff_eq!(*wn, *wa, epsilon = THR);
    }
}

#[test]
fn collapse_and_revival() {
    // Rabi oscillations of a coherent field collapse after t ~ 3 and revive
    // near t = 4π √avg_n ≈ 28
    let sim = coherent_field_simulation();
    let inv = sim.run_analytical();
    let swing = |t0: f64, t1: f64| -> f64 {
        let (lo, hi)
            = inv.iter()
            .filter(|(t, _)| (t0..t1).contains(t))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, w)| {
                (lo.min(w), hi.max(w))
            });
        hi - lo
    };
    assert!(swing(0.0, 2.0) > 1.0);
    assert!(swing(6.0, 8.0) < 0.1);
    assert!(swing(26.0, 30.0) > 0.5);
}

#[test]
fn thermal_field_from_config() {
    let text = "\
        [field]\n\
        avg_n = 2\n\
        pdf_n = \"BoseEinstein\"\n\
        cut_n = 60\n\
        [atom]\n\
        Cg = 1.0\n\
        Ce = 0.0\n\
        [interaction]\n\
        int_coupling = 1.0\n\
        int_detuning = 0.5\n\
        [simulation]\n\
        time = 30\n\
        step = 0.05\n\
        [output]\n\
        save_txt = false\n\
        out_label = \"thermal\"\n";
    let config: Config = text.parse().unwrap();
    let sim = config.build().unwrap();
    let numerical = sim.run().unwrap();
    let analytical = sim.run_analytical();
    assert!(numerical.max_abs_diff(&analytical) < THR);
}
