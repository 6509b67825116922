use beacon_core::*;

fn gas_frame(counter: u8, value: i16) -> Vec<u8> {
    IBeaconFrame::new(
        BeaconUuid::from_text("EPSG-GTI-PROY-3A").unwrap(),
        MeasurementKind::Gas.major(counter),
        value,
        -53,
    )
    .to_stripped_bytes()
}

#[test]
fn gas_reading_end_to_end() -> Result<(), DecodeError> {
    let frame = decode(&gas_frame(3, 200))?;
    let measurement = Measurement::extract(&frame);

    assert_eq!(
        measurement,
        Measurement {
            kind: MeasurementKind::Gas,
            counter: 3,
            value: 200,
        }
    );

    let (state, observation) = SequencerState::new().observe(measurement.counter);
    assert_eq!(observation, Observation::Accepted);
    assert_eq!(state.last_counter(), Some(3));

    Ok(())
}

#[test]
fn repeated_broadcasts_produce_one_reading() -> Result<(), DecodeError> {
    let broadcasts = [
        gas_frame(1, 133),
        gas_frame(1, 133),
        gas_frame(1, 133),
        gas_frame(2, 140),
        gas_frame(2, 140),
    ];

    let mut state = SequencerState::new();
    let mut accepted = Vec::new();

    for raw in &broadcasts {
        let measurement = decode(raw)?.measurement();
        let (next, observation) = state.observe(measurement.counter);
        state = next;
        if observation == Observation::Accepted {
            accepted.push(measurement.value);
        }
    }

    assert_eq!(accepted, [133, 140]);
    Ok(())
}

#[test]
fn rejected_frame_leaves_state_alone() {
    let state = SequencerState::Tracking { last: 4 };

    let raw = &gas_frame(5, 10)[..20];
    assert!(matches!(decode(raw), Err(DecodeError::TooShort { .. })));

    // nothing to observe, the state is still the one from before
    assert_eq!(state.observe(4).1, Observation::Duplicate);
}

#[test]
fn diagnostic_renderings() {
    let frame = decode(&gas_frame(3, 200)).unwrap();

    assert_eq!(codec::bytes_to_hex(&frame.major), "0b:03:");
    assert_eq!(codec::bytes_to_hex(&frame.minor), "00:c8:");
    assert_eq!(codec::bytes_to_latin1(&frame.uuid.0), "EPSG-GTI-PROY-3A");
}
