use fglm_lift::{
    domains::{
        finite_field::PrimeIteratorU64,
        integer::Integer,
        rational::{BoundedReconstruction, MaximalQuotientReconstruction, Rational},
    },
    fglm::{
        crt::CrtAccumulator,
        lift::{LiftSettings, MultiModularLift},
        matrix::{CrtMatrix, MatrixStructure, ModularMatrix, RationalMatrix},
        reconstruct::{reconstruct_dense_entries, Progress, ResumeCursor},
        LiftError,
    },
};

/// A 2x3 matrix with one trivial row at structural position 2.
fn structure() -> MatrixStructure {
    MatrixStructure::from_parallel(2, 3, &[0], &[2], &[1, 2], &[0, 1]).unwrap()
}

fn image(prime: u64, residues: &[u64]) -> ModularMatrix {
    ModularMatrix::from_residues(structure(), prime, residues.to_vec()).unwrap()
}

fn rationals(v: &[(i64, i64)]) -> Vec<Rational> {
    v.iter().map(|&r| r.into()).collect()
}

#[test]
fn structure_transfer() {
    let m = image(7, &[1, 2, 3, 4, 5, 6]);
    let crt = CrtMatrix::from_modular(&m).unwrap();
    let rat = RationalMatrix::from_modular(&m).unwrap();

    assert_eq!(
        crt.structure().to_parallel(),
        (vec![0], vec![2], vec![1, 2], vec![0, 1])
    );
    assert_eq!(crt.structure(), m.structure());
    assert_eq!(rat.structure(), m.structure());
    assert_eq!(crt.data(), &[1, 2, 3, 4, 5, 6]);
}

#[test]
fn identity_accumulation() {
    let first = image(7, &[1, 2, 3, 4, 5, 6]);
    let mut lift =
        MultiModularLift::new(&first, LiftSettings::default(), BoundedReconstruction::new())
            .unwrap();

    lift.add_image(&image(11, &[1, 2, 3, 4, 5, 6])).unwrap();
    assert_eq!(lift.modulus(), &Integer::from(77));
    assert_eq!(lift.crt_matrix().data(), &[1, 2, 3, 4, 5, 6]);
}

#[test]
fn crt_combination() {
    let s = MatrixStructure::from_parallel(1, 1, &[], &[], &[0], &[0]).unwrap();
    let first = ModularMatrix::from_residues(s.clone(), 7, vec![3]).unwrap();
    let second = ModularMatrix::from_residues(s, 11, vec![5]).unwrap();

    let mut crt = CrtMatrix::from_modular(&first).unwrap();
    CrtAccumulator::new(1)
        .unwrap()
        .accumulate(&mut crt, &second, &Integer::from(7), &Integer::from(77))
        .unwrap();
    assert_eq!(crt.data(), &[38]);
}

#[test]
fn complete_reconstruction() {
    let m = image(1000003, &[1, 2, 3, 4, 5, 6]);
    let crt = CrtMatrix::from_modular(&m).unwrap();
    let mut rat = RationalMatrix::from_modular(&m).unwrap();

    let outcome = reconstruct_dense_entries(
        &mut rat,
        &crt,
        &Integer::from(1000003),
        &BoundedReconstruction::new(),
        ResumeCursor::new(),
    )
    .unwrap();

    assert_eq!(outcome.confirmed, 6);
    assert_eq!(outcome.cursor.position(), 6);
    assert_eq!(outcome.progress, Some(Progress::Complete));
    assert_eq!(rat.data(), rationals(&[(1, 1), (2, 1), (3, 1), (4, 1), (5, 1), (6, 1)]));
    assert_eq!(rat.to_string(), "{{1,2,3},{4,5,6}}");
}

#[test]
fn partial_reconstruction() {
    // the fourth entry is 1/1001
    let m = image(1000003, &[1, 2, 3, 249751, 5, 6]);
    let crt = CrtMatrix::from_modular(&m).unwrap();
    let mut rat = RationalMatrix::from_modular(&m).unwrap();

    let outcome = reconstruct_dense_entries(
        &mut rat,
        &crt,
        &Integer::from(1000003),
        &BoundedReconstruction::new(),
        ResumeCursor::new(),
    )
    .unwrap();

    assert_eq!(outcome.confirmed, 3);
    assert_eq!(outcome.cursor.position(), 2);
    assert_eq!(outcome.progress.map(|p| p.to_string()), Some("<50.00%>".to_owned()));
}

#[test]
fn resumed_lift() {
    let expected = rationals(&[(1, 2), (-3, 1), (7, 5), (1, 1001), (0, 1), (22, 7)]);

    let mut lift = MultiModularLift::new(
        &image(1000003, &[500002, 1000000, 200002, 249751, 0, 714291]),
        LiftSettings {
            n_threads: 3,
            verbose: false,
        },
        BoundedReconstruction::new(),
    )
    .unwrap();

    let outcome = lift.reconstruct().unwrap();
    assert_eq!(outcome.confirmed, 3);
    assert_eq!(lift.cursor().position(), 2);
    assert_eq!(
        outcome.progress,
        Some(Progress::Partial {
            confirmed: 3,
            total: 6
        })
    );
    assert_eq!(&lift.rational_matrix().data()[..3], &expected[..3]);

    lift.add_image(&image(1000033, &[500017, 1000030, 200008, 735289, 0, 142865]))
        .unwrap();
    let outcome = lift.reconstruct().unwrap();
    assert!(outcome.is_complete());
    assert!(lift.is_complete());
    assert_eq!(lift.primes(), &[1000003, 1000033]);

    let check = image(1000037, &[500019, 1000034, 800031, 78924, 0, 285728]);
    assert_eq!(lift.verify(&check), Ok(true));

    let wrong = image(1000037, &[500019, 1000034, 800031, 78924, 1, 285728]);
    assert_eq!(lift.verify(&wrong), Ok(false));

    assert_eq!(lift.into_rational_matrix().data(), expected);
}

#[test]
fn coincidental_reconstruction_needs_more_primes() {
    let expected = rationals(&[(1, 1001), (1, 2), (-3, 1), (7, 5), (0, 1), (12345, 67891)]);

    let mut lift = MultiModularLift::new(
        &image(1000003, &[249751, 500002, 1000000, 200002, 0, 15967]),
        LiftSettings::default(),
        BoundedReconstruction::new(),
    )
    .unwrap();

    let outcome = lift.reconstruct().unwrap();
    assert_eq!(outcome.confirmed, 0);
    assert_eq!(outcome.progress, None);

    lift.add_image(&image(1000033, &[735289, 500017, 1000030, 200008, 0, 917398]))
        .unwrap();
    assert_eq!(
        lift.crt_matrix().data(),
        &[
            Integer::from(183822801217u64),
            Integer::from(500018000050u64),
            Integer::from(1000036000096u64),
            Integer::from(400014400041u64),
            Integer::from(0),
            Integer::from(869984625913u64),
        ]
    );

    assert!(lift.reconstruct().unwrap().is_complete());
    assert_eq!(lift.rational_matrix().data(), expected);
}

#[test]
fn repeated_scans_are_stable() {
    let m = image(1000003, &[1, 2, 3, 249751, 5, 6]);
    let crt = CrtMatrix::from_modular(&m).unwrap();
    let mut rat = RationalMatrix::from_modular(&m).unwrap();
    let modulus = Integer::from(1000003);
    let rec = MaximalQuotientReconstruction::default();

    let mut cursor = ResumeCursor::new();
    let mut last = None;
    for _ in 0..3 {
        let outcome = reconstruct_dense_entries(&mut rat, &crt, &modulus, &rec, cursor).unwrap();
        if let Some(l) = last {
            assert_eq!(outcome.confirmed, l);
        }
        last = Some(outcome.confirmed);
        cursor = outcome.cursor;
        assert_eq!(cursor.position(), outcome.confirmed.saturating_sub(1));
    }
}

#[test]
fn lift_from_generated_primes() {
    let expected = rationals(&[
        (-123456789, 1000),
        (1, 3),
        (987654321, 123456789),
        (0, 1),
        (-1, 999999999),
        (42, 1),
    ]);
    let mut primes = PrimeIteratorU64::new(1 << 31);

    let image_for = |p: u64| {
        let field = fglm_lift::domains::finite_field::Zp64::new(p);
        let residues = expected
            .iter()
            .map(|q| field.from_element(&q.try_to_finite_field(&field).unwrap()))
            .collect();
        ModularMatrix::from_residues(structure(), p, residues).unwrap()
    };

    let first = primes.next().unwrap();
    let mut lift = MultiModularLift::new(
        &image_for(first),
        LiftSettings {
            n_threads: 4,
            verbose: false,
        },
        BoundedReconstruction::new(),
    )
    .unwrap();

    // residues that reconstruct by coincidence are trusted by later scans, so a
    // complete scan is checked against a fresh prime and restarted if it disagrees
    let mut rounds = 0;
    loop {
        let complete = lift.reconstruct().unwrap().is_complete();
        let next = image_for(primes.next().unwrap());
        if complete {
            if lift.verify(&next).unwrap() {
                break;
            }
            lift.restart_scan();
        }
        lift.add_image(&next).unwrap();
        rounds += 1;
        assert!(rounds < 10);
    }

    assert_eq!(rounds, 2);
    assert_eq!(lift.primes().len(), 3);
    assert_eq!(lift.rational_matrix().data(), expected);
}

#[test]
fn unlucky_prime_is_an_error() {
    let mut lift = MultiModularLift::new(
        &image(1000003, &[1, 2, 3, 4, 5, 6]),
        LiftSettings::default(),
        BoundedReconstruction::new(),
    )
    .unwrap();

    let other = MatrixStructure::from_parallel(2, 3, &[2], &[0], &[0, 1], &[0, 1]).unwrap();
    let unlucky = ModularMatrix::from_residues(other, 1000033, vec![1; 6]).unwrap();

    assert_eq!(lift.add_image(&unlucky), Err(LiftError::StructureMismatch));
    assert_eq!(lift.modulus(), &Integer::from(1000003));
    assert_eq!(lift.primes().len(), 1);
}
