use approx::assert_relative_eq;
use vizij_rig_core::expression::{
    scale_attribute, Anchor, AxisDriver, Coefficient, Formula, ScaleExpr, MOUTH_UP_FACTOR,
};
use vizij_rig_core::math::Axis;
use vizij_rig_core::{FaceRole, RigError, TransformChannel};

#[test]
fn face_roles_render_legacy_text() {
    let d = 0.0625;
    let cases = [
        (FaceRole::EyeUp, "-0.0625*.3*"),
        (FaceRole::EyeTopDown, "-0.0625*.7+0.0625*"),
        (FaceRole::MouthUp, "0.0625*.3*"),
        (FaceRole::MouthDown, "0.0625*-.3*"),
        (FaceRole::MouthLeft, "0.0625*.05*"),
        (FaceRole::MouthRight, "0.0625*-.05*"),
    ];
    for (role, prefix) in cases {
        assert_eq!(role.scale_expr(d).prefix(), prefix, "{role}");
    }
    assert_eq!(
        FaceRole::EyeUp.scale_expr(d).render("var"),
        "(-0.0625*.3*(var))"
    );
}

#[test]
fn face_roles_evaluate_numerically() {
    let d = 0.5;
    assert_relative_eq!(FaceRole::EyeUp.scale_expr(d).evaluate(2.0), -0.3);
    assert_relative_eq!(FaceRole::EyeTopDown.scale_expr(d).evaluate(2.0), -0.35 + 1.0);
    assert_relative_eq!(FaceRole::MouthRight.scale_expr(d).evaluate(1.0), -0.025);
}

#[test]
fn identity_expression_outputs_raw_value() {
    assert_eq!(ScaleExpr::Identity.prefix(), "");
    assert_eq!(ScaleExpr::Identity.render("var"), "var");
    assert_eq!(ScaleExpr::Identity.evaluate(0.7), 0.7);
}

#[test]
fn only_one_axis_is_active_per_face_role() {
    let eye = FaceRole::EyeTopDown.attribute("face_left_eye_t", "face_left_eye", 0.0625);
    assert_eq!(eye.target, "face_left_eye_t");
    assert_eq!(eye.channel, TransformChannel::Location);
    assert_eq!(eye.axis_masks(), ["", "", "scale.z"]);
    assert_eq!(eye.scale_expressions(), ["", "", "-0.0625*.7+0.0625*"]);
    assert_eq!(eye.active_axes().count(), 1);

    let mouth = FaceRole::MouthLeft.attribute("face_mouth_r", "face_mouth", 0.0625);
    assert_eq!(mouth.axis_masks(), ["scale.x", "", ""]);
    let (axis, driver) = mouth.active_axes().next().unwrap();
    assert_eq!(axis, Axis::X);
    assert_eq!(driver.variables[0].object, "face_mouth");
}

#[test]
fn unknown_role_is_a_configuration_error() {
    let err = "eye_sideways".parse::<FaceRole>().unwrap_err();
    match err {
        RigError::Configuration { role } => assert_eq!(role, "eye_sideways"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!("mouth_left".parse::<FaceRole>().unwrap(), FaceRole::MouthLeft);
}

#[test]
fn segment_formula_renders_and_evaluates() {
    let anchored = Formula::Segment {
        anchor: Anchor::Constant(-0.25),
        rig_length: 0.25,
    };
    assert_eq!(anchored.render(), "-0.25+(head-tail)/length*0.25");

    let chained = Formula::Segment {
        anchor: Anchor::Variable,
        rig_length: 0.5,
    };
    assert_eq!(chained.render(), "origin+(head-tail)/length*0.5");
    let value = chained.evaluate(|name| match name {
        "origin" => Some(1.0),
        "head" => Some(0.75),
        "tail" => Some(0.5),
        "length" => Some(0.25),
        _ => None,
    });
    assert_eq!(value, Some(1.5));

    // zero detected length collapses onto the anchor
    let collapsed = chained.evaluate(|name| match name {
        "origin" => Some(1.0),
        "length" => Some(0.0),
        _ => None,
    });
    assert_eq!(collapsed, Some(1.0));
}

#[test]
fn custom_scale_attribute() {
    let expr = ScaleExpr::Scaled(vec![
        Coefficient::Distance(2.0),
        Coefficient::Factor(MOUTH_UP_FACTOR),
    ]);
    let attr = scale_attribute("target", "source", Axis::Y, expr);
    let driver: &AxisDriver = attr.axes[1].as_ref().unwrap();
    assert_eq!(driver.render(), "(2*.3*(var))");
    assert_eq!(attr.variable_objects().collect::<Vec<_>>(), vec!["source"]);
}
