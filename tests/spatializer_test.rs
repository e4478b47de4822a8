use tactus::backend::{Stepper, VirtualBackend};
use tactus::signals::{Envelope, Scalar};
use tactus::{Curve, Error, Point, Session, Spatializer};

fn session() -> (Session, Stepper) {
    let (backend, stepper) = VirtualBackend::manual();
    let mut session = Session::with_backend(backend);
    session.open().unwrap();
    (session, stepper)
}

fn volume(spatializer: &Spatializer, channel: usize) -> f64 {
    spatializer.session().unwrap().get_volume(channel).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn defaults() {
    let spatializer = Spatializer::new();
    assert_eq!(spatializer.target(), Point::new(0.5, 0.5));
    assert_eq!(spatializer.radius(), 0.25);
    assert_eq!(spatializer.roll_off(), Curve::LINEAR);
    assert_eq!(spatializer.volume(), 1.0);
    assert_eq!(spatializer.pitch(), 1.0);
    assert!(spatializer.is_auto_updating());
    assert!(!spatializer.is_bound());
}

#[test]
fn volume_falls_off_with_distance() {
    let (mut session, stepper) = session();
    let mut spatializer = Spatializer::bound(&mut session);
    spatializer.set_position(0, (0.5, 0.5));
    spatializer.set_position(1, (0.5, 0.9));
    spatializer.set_position(2, (0.6, 0.5));
    stepper.render(8);

    assert_eq!(volume(&spatializer, 0), 1.0);
    assert_eq!(volume(&spatializer, 1), 0.0);
    assert!(close(volume(&spatializer, 2), 0.6));
    // unmanaged channels are left alone
    assert_eq!(volume(&spatializer, 3), 1.0);

    spatializer.set_roll_off(Curve::QUADRATIC_IN);
    spatializer.set_volume(0.5);
    stepper.render(8);
    assert_eq!(volume(&spatializer, 0), 0.5);
    assert!(close(volume(&spatializer, 2), 0.36 * 0.5));
}

#[test]
fn wrapped_axes_have_no_seam() {
    let mut spatializer = Spatializer::new();
    spatializer.set_wrap((1.0, 0.0));
    spatializer.set_target((0.99, 0.5));
    let at_zero = spatializer.volume_at(Point::new(0.0, 0.5));
    let at_one = spatializer.volume_at(Point::new(1.0, 0.5));
    assert!(close(at_zero, at_one));
    assert!(close(at_zero, 0.96));

    // the y axis does not wrap
    spatializer.set_target((0.5, 0.99));
    assert_eq!(spatializer.volume_at(Point::new(0.5, 0.0)), 0.0);
}

#[test]
fn grids_fill_the_unit_square() {
    let (mut session, _stepper) = session();
    let mut spatializer = Spatializer::bound(&mut session);
    assert!(!spatializer.create_grid(3, 3));
    assert_eq!(spatializer.channel_count(), 0);

    assert!(spatializer.create_grid(2, 4));
    assert_eq!(spatializer.channels(), (0..8).collect::<Vec<_>>());
    assert_eq!(spatializer.position(0), Some(Point::new(0.0, 0.0)));
    assert_eq!(spatializer.position(3), Some(Point::new(1.0, 0.0)));
    assert_eq!(spatializer.position(7), Some(Point::new(1.0, 1.0)));
    let p = spatializer.position(5).unwrap();
    assert!(close(p.x, 1.0 / 3.0) && p.y == 1.0);

    assert!(spatializer.create_grid(1, 1));
    assert_eq!(spatializer.channel_count(), 1);
    assert_eq!(spatializer.position(0), Some(Point::new(0.5, 0.5)));
}

#[test]
fn unbound_spatializers_only_keep_layout() {
    let mut spatializer = Spatializer::new();
    assert!(!spatializer.create_grid(1, 2));
    spatializer.set_position(4, (0.1, 0.1));
    assert!(spatializer.has_channel(4));
    assert!(spatializer.play(Scalar::new(1.0)).is_ok());
    assert!(spatializer.stop().is_ok());
    assert!(spatializer.set_pitch(2.0).is_ok());
    assert!(spatializer.remove(4));
    assert!(!spatializer.remove(4));
}

#[test]
fn batched_updates() {
    let (mut session, stepper) = session();
    let mut spatializer = Spatializer::bound(&mut session);
    spatializer.set_position(0, (0.5, 0.5));
    spatializer.auto_update(false);
    spatializer.set_target((0.0, 0.0));
    stepper.render(8);
    assert_eq!(volume(&spatializer, 0), 1.0);

    spatializer.update().unwrap();
    stepper.render(8);
    assert_eq!(volume(&spatializer, 0), 0.0);
}

#[test]
fn a_missing_channel_does_not_starve_the_others() {
    let (mut session, stepper) = session();
    let mut spatializer = Spatializer::bound(&mut session);
    spatializer.auto_update(false);
    assert!(spatializer.create_grid(2, 4));
    spatializer.set_position(100, (0.5, 0.5));
    spatializer.set_radius(0.1);
    spatializer.set_target((5.0, 5.0));

    for _ in 0..10 {
        assert_eq!(
            spatializer.update(),
            Err(Error::InvalidChannel { channel: 100, count: 8 })
        );
        stepper.render(8);
        for channel in 0..8 {
            assert_eq!(volume(&spatializer, channel), 0.0);
        }
        spatializer.set_target((0.0, 0.0));
        assert!(spatializer.update().is_err());
        stepper.render(8);
        assert_eq!(volume(&spatializer, 0), 1.0);
        spatializer.set_target((5.0, 5.0));
    }
    assert!(spatializer.update().is_err());
    stepper.render(8);

    spatializer.set_pitch(2.0).unwrap_err();
    assert!(spatializer.play(Envelope::new(1.0, 1.0)).is_err());
    let out = stepper.render(4);
    assert!(out[..8].iter().all(|&s| s == 0.0));
    let session = spatializer.session().unwrap();
    assert!((0..8).all(|channel| session.is_playing(channel)));
    assert!((0..8).all(|channel| session.get_pitch(channel) == Ok(2.0)));

    assert!(spatializer.stop().is_err());
    stepper.render(4);
    assert!((0..8).all(|channel| !spatializer.session().unwrap().is_playing(channel)));
}

#[test]
fn playback_and_pitch_reach_every_managed_channel() {
    let (mut session, stepper) = session();
    let mut spatializer = Spatializer::bound(&mut session);
    spatializer.set_radius(2.0);
    spatializer.set_position(1, (0.5, 0.5));
    spatializer.set_position(6, (0.5, 0.5));
    spatializer.set_pitch(2.0).unwrap();
    spatializer.play(Envelope::new(1.0, 1.0)).unwrap();
    let out = stepper.render(4);
    assert_eq!(out[1], 1.0);
    assert_eq!(out[6], 1.0);
    assert_eq!(out[0], 0.0);

    let session = spatializer.session().unwrap();
    assert!(session.is_playing(1) && session.is_playing(6));
    assert_eq!(session.get_pitch(6), Ok(2.0));
    assert_eq!(session.get_pitch(0), Ok(1.0));

    spatializer.stop().unwrap();
    stepper.render(4);
    assert!(!spatializer.session().unwrap().is_playing(1));
}

#[test]
fn letting_go_resets_channels() {
    let (mut session, stepper) = session();
    {
        let mut spatializer = Spatializer::bound(&mut session);
        spatializer.set_position(0, (0.0, 0.0));
        spatializer.set_position(1, (0.5, 0.5));
        spatializer.set_pitch(0.5).unwrap();
        spatializer.play(Envelope::new(1.0, 1.0)).unwrap();
        stepper.render(8);
        assert_eq!(volume(&spatializer, 0), 0.0);

        spatializer.remove(1);
        stepper.render(8);
        let session = spatializer.session().unwrap();
        assert!(!session.is_playing(1));
        assert_eq!(session.get_pitch(1), Ok(1.0));
    }
    stepper.render(8);
    assert_eq!(session.get_volume(0), Ok(1.0));
    assert_eq!(session.get_pitch(0), Ok(1.0));
    assert!(!session.is_playing(0));
}

#[test]
fn rebinding_moves_control_to_the_new_session() {
    let (mut first, first_stepper) = session();
    let (mut second, second_stepper) = session();
    let mut spatializer = Spatializer::new();
    spatializer.set_position(0, (0.0, 0.0));
    spatializer.bind(&mut first);
    first_stepper.render(4);
    assert_eq!(volume(&spatializer, 0), 0.0);

    spatializer.bind(&mut second);
    second_stepper.render(4);
    assert_eq!(volume(&spatializer, 0), 0.0);
    spatializer.unbind();
    assert!(!spatializer.is_bound());
    drop(spatializer);

    first_stepper.render(4);
    assert_eq!(first.get_volume(0), Ok(1.0));
}
