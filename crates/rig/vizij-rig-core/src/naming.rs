//! Marker names shared by the pose assignment and the rig adapters.

/// Landmark index → marker name for the 33-point body model.
pub const POSE_LANDMARKS: [&str; 33] = [
    "nose",
    "left_eye_inner",
    "left_eye",
    "left_eye_outer",
    "right_eye_inner",
    "right_eye",
    "right_eye_outer",
    "left_ear",
    "right_ear",
    "mouth_left",
    "mouth_right",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_pinky",
    "right_pinky",
    "left_index",
    "right_index",
    "left_thumb",
    "right_thumb",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
    "left_heel",
    "right_heel",
    "left_foot_index",
    "right_foot_index",
];

/// Marker name for a landmark index, including the derived centers.
pub fn landmark_name(index: usize) -> Option<&'static str> {
    match index {
        SHOULDER_CENTER_INDEX => Some(pose::SHOULDER_CENTER),
        HIP_CENTER_INDEX => Some(pose::HIP_CENTER),
        _ => POSE_LANDMARKS.get(index).copied(),
    }
}

/// Derived landmark indices follow the detected ones.
pub const SHOULDER_CENTER_INDEX: usize = 33;
pub const HIP_CENTER_INDEX: usize = 34;

pub mod pose {
    pub const LEFT_SHOULDER: &str = "left_shoulder";
    pub const RIGHT_SHOULDER: &str = "right_shoulder";
    pub const LEFT_ELBOW: &str = "left_elbow";
    pub const RIGHT_ELBOW: &str = "right_elbow";
    pub const LEFT_WRIST: &str = "left_wrist";
    pub const RIGHT_WRIST: &str = "right_wrist";
    pub const LEFT_INDEX: &str = "left_index";
    pub const RIGHT_INDEX: &str = "right_index";

    pub const SHOULDER_CENTER: &str = "shoulder_center";
    pub const HIP_CENTER: &str = "hip_center";

    pub const LEFT_FOREARM_IK: &str = "left_forearm_ik";
    pub const RIGHT_FOREARM_IK: &str = "right_forearm_ik";
    pub const LEFT_HAND_IK: &str = "left_hand_ik";
    pub const RIGHT_HAND_IK: &str = "right_hand_ik";
    pub const LEFT_INDEX_IK: &str = "left_index_ik";
    pub const RIGHT_INDEX_IK: &str = "right_index_ik";
}

/// Face markers carry a prefix so they never collide with body landmarks.
pub mod face {
    pub const HEAD: &str = "face_head";
    pub const CHIN: &str = "face_chin";

    pub const MOUTH: &str = "face_mouth";
    pub const MOUTH_T: &str = "face_mouth_t";
    pub const MOUTH_B: &str = "face_mouth_b";
    pub const MOUTH_L: &str = "face_mouth_l";
    pub const MOUTH_R: &str = "face_mouth_r";

    pub const LEFT_EYE: &str = "face_left_eye";
    pub const LEFT_EYE_T: &str = "face_left_eye_t";
    pub const LEFT_EYE_B: &str = "face_left_eye_b";
    pub const RIGHT_EYE: &str = "face_right_eye";
    pub const RIGHT_EYE_T: &str = "face_right_eye_t";
    pub const RIGHT_EYE_B: &str = "face_right_eye_b";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landmark_names_line_up_with_pose_constants() {
        assert_eq!(landmark_name(11), Some(pose::LEFT_SHOULDER));
        assert_eq!(landmark_name(16), Some(pose::RIGHT_WRIST));
        assert_eq!(landmark_name(33), Some(pose::SHOULDER_CENTER));
        assert_eq!(landmark_name(34), Some(pose::HIP_CENTER));
        assert_eq!(landmark_name(35), None);
    }
}
