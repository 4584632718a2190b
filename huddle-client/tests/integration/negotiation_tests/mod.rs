mod test_inbound_offer;
