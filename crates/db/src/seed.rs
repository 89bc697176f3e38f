//! The club's room layout and bookable services, used to populate an empty
//! installation.

use clubstay_core::types::Amount;

pub struct RoomType {
    pub category: &'static str,
    pub self_rate: Amount,
    pub guest_rate: Amount,
    pub facilities: &'static [&'static str],
}

pub const STANDARD: RoomType = RoomType {
    category: "Standard",
    self_rate: 1500,
    guest_rate: 2000,
    facilities: &["AC", "TV", "Wi-Fi", "Attached Bathroom"],
};

pub const VIP: RoomType = RoomType {
    category: "VIP",
    self_rate: 3000,
    guest_rate: 3500,
    facilities: &["AC", "TV", "Wi-Fi", "Attached Bathroom", "Mini Fridge", "Sitting Area"],
};

pub const FAMILY: RoomType = RoomType {
    category: "Family",
    self_rate: 2000,
    guest_rate: 2500,
    facilities: &["AC", "TV", "Wi-Fi", "Attached Bathroom", "Extra Bed"],
};

/// A block of rooms sharing site, floor and type.
pub struct RoomBlock {
    pub site: &'static str,
    pub floor: &'static str,
    pub room_type: &'static RoomType,
    pub labels: &'static [&'static str],
}

pub const ROOM_LAYOUT: &[RoomBlock] = &[
    RoomBlock {
        site: "SPORTI-1",
        floor: "Ground Floor",
        room_type: &STANDARD,
        labels: &["102", "103", "104", "105", "106"],
    },
    RoomBlock {
        site: "SPORTI-1",
        floor: "First Floor",
        room_type: &VIP,
        labels: &["201", "202"],
    },
    RoomBlock {
        site: "SPORTI-1",
        floor: "First Floor",
        room_type: &FAMILY,
        labels: &["203"],
    },
    RoomBlock {
        site: "SPORTI-1",
        floor: "First Floor",
        room_type: &STANDARD,
        labels: &["204", "205", "206", "207", "208", "209", "210", "211"],
    },
    RoomBlock {
        site: "SPORTI-2",
        floor: "Ground Floor",
        room_type: &VIP,
        labels: &["01", "02", "03"],
    },
    RoomBlock {
        site: "SPORTI-2",
        floor: "First Floor",
        room_type: &STANDARD,
        labels: &[
            "101", "102", "103", "104", "105", "106", "107", "108", "109", "110", "111", "112",
            "113", "114",
        ],
    },
];

/// Number of rooms in [`ROOM_LAYOUT`].
pub fn room_count() -> usize {
    ROOM_LAYOUT.iter().map(|b| b.labels.len()).sum()
}

/// A hall or room booked by the event day.
pub struct ServiceSpec {
    pub label: &'static str,
    pub category: &'static str,
    pub site: &'static str,
    pub capacity: i32,
    pub self_rate: Amount,
    pub guest_rate: Amount,
    pub description: &'static str,
    pub facilities: &'static [&'static str],
}

pub const SERVICES: &[ServiceSpec] = &[
    ServiceSpec {
        label: "Main Function Hall",
        category: "Main Function Hall",
        site: "SPORTI-1",
        capacity: 200,
        self_rate: 5000,
        guest_rate: 8000,
        description: "Large function hall for events and celebrations",
        facilities: &["Sound System", "Projector", "Catering Area", "Air Conditioning"],
    },
    ServiceSpec {
        label: "Conference Room",
        category: "Conference Room",
        site: "SPORTI-1",
        capacity: 50,
        self_rate: 2000,
        guest_rate: 3500,
        description: "Professional conference room for meetings",
        facilities: &["Projector", "Video Conferencing", "Whiteboard", "Air Conditioning"],
    },
    ServiceSpec {
        label: "Barbeque Area",
        category: "Barbeque Area",
        site: "SPORTI-1",
        capacity: 30,
        self_rate: 1500,
        guest_rate: 2500,
        description: "Outdoor barbeque area for small gatherings",
        facilities: &["Barbeque Equipment", "Seating Area", "Lighting"],
    },
    ServiceSpec {
        label: "Conference Room",
        category: "Conference Room",
        site: "SPORTI-2",
        capacity: 40,
        self_rate: 1800,
        guest_rate: 3000,
        description: "Modern conference room for meetings",
        facilities: &["Projector", "Video Conferencing", "Whiteboard", "Air Conditioning"],
    },
    ServiceSpec {
        label: "Training Room",
        category: "Training Room",
        site: "SPORTI-2",
        capacity: 60,
        self_rate: 2500,
        guest_rate: 4000,
        description: "Spacious training room for workshops and seminars",
        facilities: &[
            "Projector",
            "Sound System",
            "Whiteboard",
            "Air Conditioning",
            "Flexible Seating",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_has_thirty_three_rooms() {
        assert_eq!(room_count(), 33);
    }

    #[test]
    fn labels_unique_per_site() {
        let mut seen = std::collections::HashSet::new();
        for block in ROOM_LAYOUT {
            for label in block.labels {
                assert!(seen.insert((block.site, *label)), "duplicate {label}");
            }
        }
    }

    #[test]
    fn service_labels_unique_per_site() {
        let mut seen = std::collections::HashSet::new();
        for service in SERVICES {
            assert!(seen.insert((service.site, service.label)), "duplicate {}", service.label);
        }
    }

    #[test]
    fn services_have_capacity_and_member_discount() {
        assert_eq!(SERVICES.len(), 5);
        for service in SERVICES {
            assert!(service.capacity > 0);
            assert!(service.self_rate < service.guest_rate, "{}", service.label);
        }
    }
}
